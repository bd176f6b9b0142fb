use docquiz_core::confetti::{parse_palette, ConfettiOptions, DEFAULT_COUNT, DEFAULT_PALETTE};

use crate::effects::{default_surface, fire_confetti};
use crate::prelude::*;

#[derive(Debug, clap::Args, Clone)]
pub struct ConfettiArgs {
    /// Number of particles
    #[arg(short, long, default_value_t = DEFAULT_COUNT)]
    pub count: usize,

    /// Palette color as #rgb or #rrggbb (repeatable)
    #[arg(long = "color")]
    pub colors: Vec<String>,
}

impl ConfettiArgs {
    fn options(&self) -> Result<ConfettiOptions> {
        let palette = if self.colors.is_empty() {
            parse_palette(&DEFAULT_PALETTE)?
        } else {
            parse_palette(&self.colors)?
        };
        Ok(ConfettiOptions::new(self.count, palette)?)
    }
}

pub async fn run(args: ConfettiArgs) -> Result<()> {
    let options = args.options()?;
    let ticks = fire_confetti(options, default_surface()).finished().await?;
    log::info!("Confetti finished after {ticks} frames");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_palette() {
        let args = ConfettiArgs {
            count: 12,
            colors: vec![],
        };
        let options = args.options().unwrap();
        assert_eq!(options.count(), 12);
        assert_eq!(options.palette().len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn test_options_rejects_zero_count_and_bad_color() {
        let zero = ConfettiArgs {
            count: 0,
            colors: vec![],
        };
        assert!(zero.options().is_err());

        let bad = ConfettiArgs {
            count: 5,
            colors: vec!["red".to_string()],
        };
        assert!(bad.options().is_err());
    }
}
