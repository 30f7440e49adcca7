use serde::{Deserialize, Serialize};

/// Visual theme behind the projected verse.
///
/// Serialized as its kebab-case tag. Unrecognized tags decode to the
/// baseline theme (`gradient-mobile`) so a viewer running an older build
/// still renders something sensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackgroundTheme {
    Black,
    White,
    Blue,
    Purple,
    GradientWarm,
    GradientCool,
    GradientSunset,
    GradientOcean,
    GradientForest,
    ParticlesSoft,
    LightRays,
    FloatingParticles,
    #[default]
    GradientMobile,
    Aurora,
    StarryNight,
    GoldenHour,
    CherryBlossom,
    NorthernLights,
    DreamyClouds,
    DeepOcean,
    Galaxy,
}

impl BackgroundTheme {
    /// The wire tag for this theme.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::GradientWarm => "gradient-warm",
            Self::GradientCool => "gradient-cool",
            Self::GradientSunset => "gradient-sunset",
            Self::GradientOcean => "gradient-ocean",
            Self::GradientForest => "gradient-forest",
            Self::ParticlesSoft => "particles-soft",
            Self::LightRays => "light-rays",
            Self::FloatingParticles => "floating-particles",
            Self::GradientMobile => "gradient-mobile",
            Self::Aurora => "aurora",
            Self::StarryNight => "starry-night",
            Self::GoldenHour => "golden-hour",
            Self::CherryBlossom => "cherry-blossom",
            Self::NorthernLights => "northern-lights",
            Self::DreamyClouds => "dreamy-clouds",
            Self::DeepOcean => "deep-ocean",
            Self::Galaxy => "galaxy",
        }
    }

    /// Parse a wire tag, falling back to the baseline theme.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "black" => Self::Black,
            "white" => Self::White,
            "blue" => Self::Blue,
            "purple" => Self::Purple,
            "gradient-warm" => Self::GradientWarm,
            "gradient-cool" => Self::GradientCool,
            "gradient-sunset" => Self::GradientSunset,
            "gradient-ocean" => Self::GradientOcean,
            "gradient-forest" => Self::GradientForest,
            "particles-soft" => Self::ParticlesSoft,
            "light-rays" => Self::LightRays,
            "floating-particles" => Self::FloatingParticles,
            "gradient-mobile" => Self::GradientMobile,
            "aurora" => Self::Aurora,
            "starry-night" => Self::StarryNight,
            "golden-hour" => Self::GoldenHour,
            "cherry-blossom" => Self::CherryBlossom,
            "northern-lights" => Self::NorthernLights,
            "dreamy-clouds" => Self::DreamyClouds,
            "deep-ocean" => Self::DeepOcean,
            "galaxy" => Self::Galaxy,
            _ => Self::default(),
        }
    }
}

impl From<String> for BackgroundTheme {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<BackgroundTheme> for String {
    fn from(theme: BackgroundTheme) -> Self {
        theme.tag().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for theme in [
            BackgroundTheme::Black,
            BackgroundTheme::GradientSunset,
            BackgroundTheme::NorthernLights,
            BackgroundTheme::Galaxy,
        ] {
            assert_eq!(BackgroundTheme::from_tag(theme.tag()), theme);
        }
    }

    #[test]
    fn test_baseline_is_gradient_mobile() {
        assert_eq!(BackgroundTheme::default(), BackgroundTheme::GradientMobile);
    }

    #[test]
    fn test_unknown_tag_is_baseline() {
        assert_eq!(
            BackgroundTheme::from_tag("disco-ball"),
            BackgroundTheme::GradientMobile
        );
        assert_eq!(BackgroundTheme::from_tag(""), BackgroundTheme::GradientMobile);
    }

    #[test]
    fn test_serde_uses_kebab_tags() {
        let json = serde_json::to_string(&BackgroundTheme::GradientMobile).unwrap();
        assert_eq!(json, "\"gradient-mobile\"");

        let theme: BackgroundTheme = serde_json::from_str("\"deep-ocean\"").unwrap();
        assert_eq!(theme, BackgroundTheme::DeepOcean);

        // Unknown tags deserialize to the baseline instead of failing
        let theme: BackgroundTheme = serde_json::from_str("\"not-a-theme\"").unwrap();
        assert_eq!(theme, BackgroundTheme::GradientMobile);
    }
}
