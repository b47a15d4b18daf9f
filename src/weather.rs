//! Present-weather groups.
//!
//! A weather group packs up to five optional codes into one token with no
//! separators, always in this order:
//!
//! ```text
//! [intensity][descriptor][precipitation][obscuration][other]
//!     +          TS            RA
//! ```
//!
//! Each code comes from a fixed table and maps onto an enum variant.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    combinator::{opt, value},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intensity or proximity prefix. Moderate is the unmarked case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    #[default]
    Moderate,
    Heavy,
    InVicinity,
}

impl Intensity {
    pub fn code(&self) -> &'static str {
        match self {
            Intensity::Light => "-",
            Intensity::Moderate => "",
            Intensity::Heavy => "+",
            Intensity::InVicinity => "VC",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::Heavy => "heavy",
            Intensity::InVicinity => "in the vicinity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    Shallow,
    Partial,
    Patches,
    LowDrifting,
    Blowing,
    Showers,
    Thunderstorm,
    Freezing,
}

impl Descriptor {
    pub fn code(&self) -> &'static str {
        match self {
            Descriptor::Shallow => "MI",
            Descriptor::Partial => "PR",
            Descriptor::Patches => "BC",
            Descriptor::LowDrifting => "DR",
            Descriptor::Blowing => "BL",
            Descriptor::Showers => "SH",
            Descriptor::Thunderstorm => "TS",
            Descriptor::Freezing => "FZ",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Descriptor::Shallow => "shallow",
            Descriptor::Partial => "partial",
            Descriptor::Patches => "patches",
            Descriptor::LowDrifting => "low drifting",
            Descriptor::Blowing => "blowing",
            Descriptor::Showers => "showers",
            Descriptor::Thunderstorm => "thunderstorm",
            Descriptor::Freezing => "freezing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precipitation {
    Drizzle,
    Rain,
    Snow,
    SnowGrains,
    IceCrystals,
    IcePellets,
    Hail,
    SnowPellets,
    /// `UP`: reported by automated stations that cannot classify it
    Unknown,
}

impl Precipitation {
    pub fn code(&self) -> &'static str {
        match self {
            Precipitation::Drizzle => "DZ",
            Precipitation::Rain => "RA",
            Precipitation::Snow => "SN",
            Precipitation::SnowGrains => "SG",
            Precipitation::IceCrystals => "IC",
            Precipitation::IcePellets => "PL",
            Precipitation::Hail => "GR",
            Precipitation::SnowPellets => "GS",
            Precipitation::Unknown => "UP",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Precipitation::Drizzle => "drizzle",
            Precipitation::Rain => "rain",
            Precipitation::Snow => "snow",
            Precipitation::SnowGrains => "snow grains",
            Precipitation::IceCrystals => "ice crystals",
            Precipitation::IcePellets => "ice pellets",
            Precipitation::Hail => "hail",
            Precipitation::SnowPellets => "snow pellets",
            Precipitation::Unknown => "unknown precipitation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Obscuration {
    Mist,
    Fog,
    Smoke,
    VolcanicAsh,
    Dust,
    Sand,
    Haze,
    Spray,
}

impl Obscuration {
    pub fn code(&self) -> &'static str {
        match self {
            Obscuration::Mist => "BR",
            Obscuration::Fog => "FG",
            Obscuration::Smoke => "FU",
            Obscuration::VolcanicAsh => "VA",
            Obscuration::Dust => "DU",
            Obscuration::Sand => "SA",
            Obscuration::Haze => "HZ",
            Obscuration::Spray => "PY",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Obscuration::Mist => "mist",
            Obscuration::Fog => "fog",
            Obscuration::Smoke => "smoke",
            Obscuration::VolcanicAsh => "volcanic ash",
            Obscuration::Dust => "widespread dust",
            Obscuration::Sand => "sand",
            Obscuration::Haze => "haze",
            Obscuration::Spray => "spray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherPhenomenon {
    Whirls,
    Squalls,
    FunnelCloud,
    Sandstorm,
    Duststorm,
}

impl OtherPhenomenon {
    pub fn code(&self) -> &'static str {
        match self {
            OtherPhenomenon::Whirls => "PO",
            OtherPhenomenon::Squalls => "SQ",
            OtherPhenomenon::FunnelCloud => "FC",
            OtherPhenomenon::Sandstorm => "SS",
            OtherPhenomenon::Duststorm => "DS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OtherPhenomenon::Whirls => "dust/sand whirls",
            OtherPhenomenon::Squalls => "squalls",
            OtherPhenomenon::FunnelCloud => "funnel cloud",
            OtherPhenomenon::Sandstorm => "sandstorm",
            OtherPhenomenon::Duststorm => "duststorm",
        }
    }
}

/// One decoded weather group.
///
/// All four descriptive fields are independently optional. A group with
/// none of them set is what the lenient decoder produces for a token it
/// does not recognize; see [`WeatherPhenomenon::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WeatherPhenomenon {
    pub intensity: Intensity,
    pub descriptor: Option<Descriptor>,
    pub precipitation: Option<Precipitation>,
    pub obscuration: Option<Obscuration>,
    pub other: Option<OtherPhenomenon>,
}

impl WeatherPhenomenon {
    /// True when no descriptive code was decoded.
    pub fn is_empty(&self) -> bool {
        self.descriptor.is_none()
            && self.precipitation.is_none()
            && self.obscuration.is_none()
            && self.other.is_none()
    }

    /// Plain-language rendering, e.g. "heavy thunderstorm rain".
    pub fn description(&self) -> String {
        let parts = [
            Some(self.intensity.description()),
            self.descriptor.map(|d| d.description()),
            self.precipitation.map(|p| p.description()),
            self.obscuration.map(|o| o.description()),
            self.other.map(|o| o.description()),
        ];
        parts.into_iter().flatten().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for WeatherPhenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.intensity.code())?;
        if let Some(d) = self.descriptor {
            write!(f, "{}", d.code())?;
        }
        if let Some(p) = self.precipitation {
            write!(f, "{}", p.code())?;
        }
        if let Some(o) = self.obscuration {
            write!(f, "{}", o.code())?;
        }
        if let Some(o) = self.other {
            write!(f, "{}", o.code())?;
        }
        Ok(())
    }
}

fn parse_intensity(input: &str) -> IResult<&str, Intensity> {
    alt((
        value(Intensity::Light, tag("-")),
        value(Intensity::Heavy, tag("+")),
        value(Intensity::InVicinity, tag("VC")),
    ))
    .parse(input)
}

fn parse_descriptor(input: &str) -> IResult<&str, Descriptor> {
    alt((
        value(Descriptor::Shallow, tag("MI")),
        value(Descriptor::Partial, tag("PR")),
        value(Descriptor::Patches, tag("BC")),
        value(Descriptor::LowDrifting, tag("DR")),
        value(Descriptor::Blowing, tag("BL")),
        value(Descriptor::Showers, tag("SH")),
        value(Descriptor::Thunderstorm, tag("TS")),
        value(Descriptor::Freezing, tag("FZ")),
    ))
    .parse(input)
}

fn parse_precipitation(input: &str) -> IResult<&str, Precipitation> {
    alt((
        value(Precipitation::Drizzle, tag("DZ")),
        value(Precipitation::Rain, tag("RA")),
        value(Precipitation::Snow, tag("SN")),
        value(Precipitation::SnowGrains, tag("SG")),
        value(Precipitation::IceCrystals, tag("IC")),
        value(Precipitation::IcePellets, tag("PL")),
        value(Precipitation::Hail, tag("GR")),
        value(Precipitation::SnowPellets, tag("GS")),
        value(Precipitation::Unknown, tag("UP")),
    ))
    .parse(input)
}

fn parse_obscuration(input: &str) -> IResult<&str, Obscuration> {
    alt((
        value(Obscuration::Mist, tag("BR")),
        value(Obscuration::Fog, tag("FG")),
        value(Obscuration::Smoke, tag("FU")),
        value(Obscuration::VolcanicAsh, tag("VA")),
        value(Obscuration::Dust, tag("DU")),
        value(Obscuration::Sand, tag("SA")),
        value(Obscuration::Haze, tag("HZ")),
        value(Obscuration::Spray, tag("PY")),
    ))
    .parse(input)
}

fn parse_other(input: &str) -> IResult<&str, OtherPhenomenon> {
    alt((
        value(OtherPhenomenon::Whirls, tag("PO")),
        value(OtherPhenomenon::Squalls, tag("SQ")),
        value(OtherPhenomenon::FunnelCloud, tag("FC")),
        value(OtherPhenomenon::Sandstorm, tag("SS")),
        value(OtherPhenomenon::Duststorm, tag("DS")),
    ))
    .parse(input)
}

/// Parse the weather codes at the start of a token.
///
/// Never fails: every code is optional, so unrecognized input yields an
/// empty phenomenon and the whole token as the remainder. Callers decide
/// whether a non-empty remainder is acceptable.
pub fn parse_weather(input: &str) -> IResult<&str, WeatherPhenomenon> {
    let (input, intensity) = opt(parse_intensity).parse(input)?;
    let (input, descriptor) = opt(parse_descriptor).parse(input)?;
    let (input, precipitation) = opt(parse_precipitation).parse(input)?;
    let (input, obscuration) = opt(parse_obscuration).parse(input)?;
    let (input, other) = opt(parse_other).parse(input)?;

    Ok((
        input,
        WeatherPhenomenon {
            intensity: intensity.unwrap_or_default(),
            descriptor,
            precipitation,
            obscuration,
            other,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_complete(token: &str) -> WeatherPhenomenon {
        let (rest, wx) = parse_weather(token).expect("weather parser never fails");
        assert_eq!(rest, "", "unconsumed input for {}", token);
        wx
    }

    #[test]
    fn test_heavy_thunderstorm_rain() {
        let wx = parse_complete("+TSRA");
        assert_eq!(wx.intensity, Intensity::Heavy);
        assert_eq!(wx.descriptor, Some(Descriptor::Thunderstorm));
        assert_eq!(wx.precipitation, Some(Precipitation::Rain));
        assert_eq!(wx.obscuration, None);
        assert_eq!(wx.other, None);
        assert_eq!(wx.description(), "heavy thunderstorm rain");
    }

    #[test]
    fn test_unmarked_intensity_is_moderate() {
        let wx = parse_complete("BR");
        assert_eq!(wx.intensity, Intensity::Moderate);
        assert_eq!(wx.obscuration, Some(Obscuration::Mist));
    }

    #[test]
    fn test_vicinity_showers() {
        let wx = parse_complete("VCSH");
        assert_eq!(wx.intensity, Intensity::InVicinity);
        assert_eq!(wx.descriptor, Some(Descriptor::Showers));
        assert_eq!(wx.precipitation, None);
    }

    #[test]
    fn test_freezing_fog() {
        let wx = parse_complete("FZFG");
        assert_eq!(wx.descriptor, Some(Descriptor::Freezing));
        assert_eq!(wx.obscuration, Some(Obscuration::Fog));
    }

    #[test]
    fn test_funnel_cloud_and_squalls() {
        assert_eq!(parse_complete("+FC").other, Some(OtherPhenomenon::FunnelCloud));
        assert_eq!(parse_complete("SQ").other, Some(OtherPhenomenon::Squalls));
        assert_eq!(parse_complete("-UP").precipitation, Some(Precipitation::Unknown));
    }

    #[test]
    fn test_all_five_axes() {
        let wx = parse_complete("-BLSNBRPO");
        assert_eq!(wx.intensity, Intensity::Light);
        assert_eq!(wx.descriptor, Some(Descriptor::Blowing));
        assert_eq!(wx.precipitation, Some(Precipitation::Snow));
        assert_eq!(wx.obscuration, Some(Obscuration::Mist));
        assert_eq!(wx.other, Some(OtherPhenomenon::Whirls));
        assert_eq!(wx.to_string(), "-BLSNBRPO");
    }

    #[test]
    fn test_codes_out_of_order_stop_parsing() {
        // Rain before thunderstorm is not a valid ordering
        let (rest, wx) = parse_weather("RATS").unwrap();
        assert_eq!(wx.precipitation, Some(Precipitation::Rain));
        assert_eq!(wx.descriptor, None);
        assert_eq!(rest, "TS");
    }

    #[test]
    fn test_garbage_yields_empty_phenomenon() {
        let (rest, wx) = parse_weather("XYZ").unwrap();
        assert!(wx.is_empty());
        assert_eq!(wx.intensity, Intensity::Moderate);
        assert_eq!(rest, "XYZ");
    }

    #[test]
    fn test_display_round_trips_codes() {
        for token in ["+TSRA", "-DZ", "VCFG", "SHGS", "MIFG", "PRFG", "BCFG", "DRSA", "DS"] {
            assert_eq!(parse_complete(token).to_string(), token);
        }
    }
}
