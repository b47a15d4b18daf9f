//! Data structures representing decoded METAR/SPECI reports.
//!
//! Every type here is a plain value built once by the decoder and never
//! mutated afterwards. Fields whose states are mutually exclusive are
//! modeled as enums, so a calm wind cannot carry a heading and a variable
//! wind cannot carry a directional variance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::weather::WeatherPhenomenon;

/// Whether the observation was scheduled or triggered by a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// `METAR`: a routine, scheduled observation
    Routine,
    /// `SPECI`: a special observation triggered by a significant change
    Special,
    /// No report type label was present
    Unspecified,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Routine => write!(f, "METAR"),
            ReportKind::Special => write!(f, "SPECI"),
            ReportKind::Unspecified => write!(f, "UNSPECIFIED"),
        }
    }
}

/// Marker for automated or corrected reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespectModifier {
    /// `AUTO`: no human intervention
    Automatic,
    /// `COR`: a corrected report
    Correction,
    /// Field omitted
    Unspecified,
}

impl RespectModifier {
    /// The code as it appears in a report, if any.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RespectModifier::Automatic => Some("AUTO"),
            RespectModifier::Correction => Some("COR"),
            RespectModifier::Unspecified => None,
        }
    }
}

/// Day of month and time of the observation, in UTC.
///
/// The report format carries no month or year. Use [`ObservationTime::resolve`]
/// with calendar context supplied by the caller to obtain a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationTime {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl ObservationTime {
    /// Resolve against a year and month into a UTC timestamp.
    ///
    /// Returns `None` if the day, hour or minute is out of range for the
    /// given month; the decoder itself only checks the digit pattern.
    pub fn resolve(&self, year: i32, month: u32) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(year, month, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, 0)
            .map(|dt| dt.and_utc())
    }
}

impl fmt::Display for ObservationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}Z", self.day, self.hour, self.minute)
    }
}

/// A range of headings the wind varied across, in the order reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectionalVariance {
    pub from: u16,
    pub to: u16,
}

impl fmt::Display for DirectionalVariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}V{:03}", self.from, self.to)
    }
}

/// Flat view of where the wind is blowing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindDirection {
    Calm,
    Variable,
    /// Degrees true
    Heading(u16),
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindDirection::Calm => write!(f, "calm"),
            WindDirection::Variable => write!(f, "variable"),
            WindDirection::Heading(degrees) => write!(f, "{:03} degrees", degrees),
        }
    }
}

/// Surface wind.
///
/// ```text
/// 00000KT          calm
/// VRB06KT          variable at 6 knots
/// 21010G18KT       210 degrees at 10 knots gusting 18
/// 21010KT 180V240  with a directional variance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wind {
    Calm,
    Variable {
        speed_knots: u16,
        gust_knots: Option<u16>,
    },
    Heading {
        degrees: u16,
        speed_knots: u16,
        gust_knots: Option<u16>,
        variance: Option<DirectionalVariance>,
    },
}

impl Wind {
    pub fn is_calm(&self) -> bool {
        matches!(self, Wind::Calm)
    }

    pub fn direction(&self) -> WindDirection {
        match self {
            Wind::Calm => WindDirection::Calm,
            Wind::Variable { .. } => WindDirection::Variable,
            Wind::Heading { degrees, .. } => WindDirection::Heading(*degrees),
        }
    }

    /// Sustained speed; zero when calm.
    pub fn speed_knots(&self) -> u16 {
        match self {
            Wind::Calm => 0,
            Wind::Variable { speed_knots, .. } | Wind::Heading { speed_knots, .. } => *speed_knots,
        }
    }

    /// Gust speed, present only when a gust group was encoded.
    pub fn gust_knots(&self) -> Option<u16> {
        match self {
            Wind::Calm => None,
            Wind::Variable { gust_knots, .. } | Wind::Heading { gust_knots, .. } => *gust_knots,
        }
    }

    pub fn variance(&self) -> Option<DirectionalVariance> {
        match self {
            Wind::Heading { variance, .. } => *variance,
            _ => None,
        }
    }
}

impl fmt::Display for Wind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, speed, gust) = match self {
            Wind::Calm => return write!(f, "00000KT"),
            Wind::Variable {
                speed_knots,
                gust_knots,
            } => ("VRB".to_string(), *speed_knots, *gust_knots),
            Wind::Heading {
                degrees,
                speed_knots,
                gust_knots,
                ..
            } => (format!("{:03}", degrees), *speed_knots, *gust_knots),
        };

        write!(f, "{}{:02}", prefix, speed)?;
        if let Some(gust) = gust {
            write!(f, "G{:02}", gust)?;
        }
        write!(f, "KT")?;
        if let Some(variance) = self.variance() {
            write!(f, " {}", variance)?;
        }
        Ok(())
    }
}

/// A non-negative distance in statute miles, kept as a reduced fraction.
///
/// `10`, `1/4` and `1 5/16` are all encodings of a rational value; two
/// encodings of the same value compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Fraction", into = "Fraction")]
pub struct StatuteMiles {
    numerator: u32,
    denominator: u32,
}

#[derive(Serialize, Deserialize)]
struct Fraction {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<Fraction> for StatuteMiles {
    type Error = String;

    fn try_from(value: Fraction) -> Result<Self, Self::Error> {
        StatuteMiles::new(value.numerator, value.denominator)
            .ok_or_else(|| "denominator must be non-zero".to_string())
    }
}

impl From<StatuteMiles> for Fraction {
    fn from(value: StatuteMiles) -> Self {
        Fraction {
            numerator: value.numerator,
            denominator: value.denominator,
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl StatuteMiles {
    /// Build a distance from a fraction, reducing it. `None` for a zero denominator.
    pub fn new(numerator: u32, denominator: u32) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let divisor = gcd(numerator, denominator);
        Some(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn whole(miles: u32) -> Self {
        Self {
            numerator: miles,
            denominator: 1,
        }
    }

    /// Build `whole + numerator/denominator`, `None` on a zero denominator or overflow.
    pub fn mixed(whole: u32, numerator: u32, denominator: u32) -> Option<Self> {
        let total = whole
            .checked_mul(denominator)?
            .checked_add(numerator)?;
        Self::new(total, denominator)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for StatuteMiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.numerator / self.denominator;
        let rest = self.numerator % self.denominator;
        match (whole, rest) {
            (w, 0) => write!(f, "{}", w),
            (0, r) => write!(f, "{}/{}", r, self.denominator),
            (w, r) => write!(f, "{} {}/{}", w, r, self.denominator),
        }
    }
}

/// Prevailing visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub distance: StatuteMiles,
    /// Set when the value is a reportable minimum (`M` prefix) rather than a reading.
    pub less_than: bool,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.less_than {
            write!(f, "M")?;
        }
        write!(f, "{}SM", self.distance)
    }
}

/// Amount of sky covered by a cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCover {
    Few,
    Scattered,
    Broken,
    Overcast,
}

impl SkyCover {
    pub fn code(&self) -> &'static str {
        match self {
            SkyCover::Few => "FEW",
            SkyCover::Scattered => "SCT",
            SkyCover::Broken => "BKN",
            SkyCover::Overcast => "OVC",
        }
    }

    /// Broken and overcast layers form a ceiling.
    pub fn is_ceiling(&self) -> bool {
        matches!(self, SkyCover::Broken | SkyCover::Overcast)
    }
}

/// Convective cloud type appended to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudType {
    Cumulonimbus,
    ToweringCumulus,
}

impl CloudType {
    pub fn code(&self) -> &'static str {
        match self {
            CloudType::Cumulonimbus => "CB",
            CloudType::ToweringCumulus => "TCU",
        }
    }
}

/// Codes reporting no cloud layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearSky {
    /// `CLR`: no clouds below 12,000 ft (automated)
    Clear,
    /// `SKC`: sky clear (manual)
    SkyClear,
    /// `NSC`: no significant cloud
    NoSignificantCloud,
    /// `NCD`: no cloud detected
    NoCloudDetected,
}

impl ClearSky {
    pub fn code(&self) -> &'static str {
        match self {
            ClearSky::Clear => "CLR",
            ClearSky::SkyClear => "SKC",
            ClearSky::NoSignificantCloud => "NSC",
            ClearSky::NoCloudDetected => "NCD",
        }
    }
}

/// One sky-condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCondition {
    Clear(ClearSky),
    Layer {
        cover: SkyCover,
        height_ft: u32,
        cloud: Option<CloudType>,
    },
    /// Indefinite ceiling; height is absent for `VV///`.
    VerticalVisibility { height_ft: Option<u32> },
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyCondition::Clear(clear) => write!(f, "{}", clear.code()),
            SkyCondition::Layer {
                cover,
                height_ft,
                cloud,
            } => {
                write!(f, "{}{:03}", cover.code(), height_ft / 100)?;
                if let Some(cloud) = cloud {
                    write!(f, "{}", cloud.code())?;
                }
                Ok(())
            }
            SkyCondition::VerticalVisibility { height_ft: Some(h) } => write!(f, "VV{:03}", h / 100),
            SkyCondition::VerticalVisibility { height_ft: None } => write!(f, "VV///"),
        }
    }
}

/// A whole-degree Celsius reading as reported.
///
/// The sign is stored separately so `M00` (just below zero, rounded) stays
/// distinct from `00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Celsius {
    pub negative: bool,
    pub degrees: u8,
}

impl Celsius {
    pub fn new(negative: bool, degrees: u8) -> Self {
        Self { negative, degrees }
    }

    /// Signed value. `M00` and `00` both give 0.
    pub fn value(&self) -> i16 {
        let degrees = i16::from(self.degrees);
        if self.negative { -degrees } else { degrees }
    }
}

impl From<i8> for Celsius {
    fn from(value: i8) -> Self {
        Self::new(value < 0, value.unsigned_abs())
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "M")?;
        }
        write!(f, "{:02}", self.degrees)
    }
}

/// Air temperature and dew point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    pub air_c: Celsius,
    pub dew_point_c: Option<Celsius>,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.air_c)?;
        if let Some(dew_point) = self.dew_point_c {
            write!(f, "{}", dew_point)?;
        }
        Ok(())
    }
}

/// Altimeter setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Altimeter {
    /// `A3034`: hundredths of an inch of mercury
    InchesHg(u16),
    /// `Q1013`: hectopascals
    Hectopascals(u16),
}

impl Altimeter {
    pub fn inches_hg(&self) -> f64 {
        match self {
            Altimeter::InchesHg(hundredths) => *hundredths as f64 / 100.0,
            Altimeter::Hectopascals(hpa) => *hpa as f64 * 0.029_53,
        }
    }
}

impl fmt::Display for Altimeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Altimeter::InchesHg(v) => write!(f, "A{:04}", v),
            Altimeter::Hectopascals(v) => write!(f, "Q{:04}", v),
        }
    }
}

/// A decoded surface weather observation.
///
/// A raw report like:
/// ```text
/// METAR KJFK 250251Z 21010G18KT 180V240 1 5/16SM -RA BR BKN043 19/09 A3034 RMK AO2
/// ```
///
/// decodes into a `Report` with:
/// - `kind`: ReportKind::Routine
/// - `station`: "KJFK"
/// - `time`: day 25, 02:51 UTC
/// - `wind`: 210 degrees at 10 knots gusting 18, varying 180 to 240
/// - `visibility`: 21/16 statute miles
/// - `weather`: light rain, then mist
/// - `sky`: broken at 4,300 ft
/// - `remarks`: "AO2"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,

    /// Four-character station code, passed through verbatim.
    pub station: String,

    pub time: ObservationTime,

    pub modifier: RespectModifier,

    pub wind: Wind,

    pub visibility: Visibility,

    /// Present-weather groups in the order reported.
    pub weather: Vec<WeatherPhenomenon>,

    pub sky: Vec<SkyCondition>,

    pub temperature: Option<Temperature>,

    pub altimeter: Option<Altimeter>,

    /// Everything after `RMK`, undecoded.
    pub remarks: Option<String>,

    /// Tokens the lenient decoder skipped before the remarks.
    pub unparsed: Vec<String>,
}

impl Report {
    /// The lowest broken or overcast layer, or a vertical visibility.
    pub fn ceiling_ft(&self) -> Option<u32> {
        self.sky.iter().find_map(|layer| match layer {
            SkyCondition::Layer {
                cover, height_ft, ..
            } if cover.is_ceiling() => Some(*height_ft),
            SkyCondition::VerticalVisibility { height_ft } => *height_ft,
            _ => None,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind != ReportKind::Unspecified {
            write!(f, "{} ", self.kind)?;
        }
        write!(f, "{} {}", self.station, self.time)?;
        if let Some(code) = self.modifier.code() {
            write!(f, " {}", code)?;
        }
        write!(f, " {} {}", self.wind, self.visibility)?;
        for phenomenon in &self.weather {
            write!(f, " {}", phenomenon)?;
        }
        for layer in &self.sky {
            write!(f, " {}", layer)?;
        }
        if let Some(temperature) = self.temperature {
            write!(f, " {}", temperature)?;
        }
        if let Some(altimeter) = self.altimeter {
            write!(f, " {}", altimeter)?;
        }
        if let Some(ref remarks) = self.remarks {
            write!(f, " RMK {}", remarks)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statute_miles_reduces() {
        let quarter = StatuteMiles::new(4, 16).unwrap();
        assert_eq!(quarter, StatuteMiles::new(1, 4).unwrap());
        assert_eq!(quarter.numerator(), 1);
        assert_eq!(quarter.denominator(), 4);
        assert!((quarter.as_f64() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statute_miles_mixed() {
        let miles = StatuteMiles::mixed(1, 5, 16).unwrap();
        assert_eq!(miles, StatuteMiles::new(21, 16).unwrap());
        assert_eq!(miles.to_string(), "1 5/16");
        assert_eq!(StatuteMiles::whole(10).to_string(), "10");
        assert_eq!(StatuteMiles::new(3, 4).unwrap().to_string(), "3/4");
    }

    #[test]
    fn test_statute_miles_rejects_zero_denominator() {
        assert!(StatuteMiles::new(1, 0).is_none());
        assert!(StatuteMiles::mixed(1, 1, 0).is_none());
        assert!(StatuteMiles::mixed(u32::MAX, 1, 2).is_none());
    }

    #[test]
    fn test_statute_miles_deserialize_checks_denominator() {
        let ok: StatuteMiles = serde_json::from_str(r#"{"numerator":2,"denominator":8}"#).unwrap();
        assert_eq!(ok, StatuteMiles::new(1, 4).unwrap());
        assert!(serde_json::from_str::<StatuteMiles>(r#"{"numerator":1,"denominator":0}"#).is_err());
    }

    #[test]
    fn test_wind_accessors() {
        let calm = Wind::Calm;
        assert!(calm.is_calm());
        assert_eq!(calm.direction(), WindDirection::Calm);
        assert_eq!(calm.speed_knots(), 0);
        assert_eq!(calm.gust_knots(), None);
        assert_eq!(calm.variance(), None);

        let gusty = Wind::Heading {
            degrees: 210,
            speed_knots: 10,
            gust_knots: Some(18),
            variance: Some(DirectionalVariance { from: 180, to: 240 }),
        };
        assert!(!gusty.is_calm());
        assert_eq!(gusty.direction(), WindDirection::Heading(210));
        assert_eq!(gusty.gust_knots(), Some(18));
        assert_eq!(gusty.to_string(), "21010G18KT 180V240");
    }

    #[test]
    fn test_wind_display() {
        assert_eq!(Wind::Calm.to_string(), "00000KT");
        let vrb = Wind::Variable {
            speed_knots: 6,
            gust_knots: None,
        };
        assert_eq!(vrb.to_string(), "VRB06KT");
        assert_eq!(vrb.direction(), WindDirection::Variable);
    }

    #[test]
    fn test_observation_time_resolve() {
        let time = ObservationTime {
            day: 25,
            hour: 2,
            minute: 51,
        };
        let resolved = time.resolve(2024, 5).unwrap();
        assert_eq!(resolved.to_rfc3339(), "2024-05-25T02:51:00+00:00");
        assert_eq!(time.to_string(), "250251Z");
    }

    #[test]
    fn test_observation_time_resolve_out_of_range() {
        let feb_30 = ObservationTime {
            day: 30,
            hour: 12,
            minute: 0,
        };
        assert!(feb_30.resolve(2024, 2).is_none());

        let bad_hour = ObservationTime {
            day: 1,
            hour: 25,
            minute: 0,
        };
        assert!(bad_hour.resolve(2024, 1).is_none());
    }

    #[test]
    fn test_temperature_display() {
        let t = Temperature {
            air_c: (-3).into(),
            dew_point_c: Some((-10).into()),
        };
        assert_eq!(t.to_string(), "M03/M10");
        let t = Temperature {
            air_c: 19.into(),
            dew_point_c: None,
        };
        assert_eq!(t.to_string(), "19/");
        let t = Temperature {
            air_c: Celsius::new(true, 0),
            dew_point_c: Some(Celsius::new(true, 1)),
        };
        assert_eq!(t.to_string(), "M00/M01");
    }

    #[test]
    fn test_celsius_sign() {
        let minus_zero = Celsius::new(true, 0);
        assert_ne!(minus_zero, Celsius::from(0));
        assert_eq!(minus_zero.value(), 0);
        assert_eq!(Celsius::from(-12).value(), -12);
        assert_eq!(Celsius::from(7).to_string(), "07");
    }

    #[test]
    fn test_sky_condition_display() {
        let layer = SkyCondition::Layer {
            cover: SkyCover::Broken,
            height_ft: 4300,
            cloud: Some(CloudType::Cumulonimbus),
        };
        assert_eq!(layer.to_string(), "BKN043CB");
        assert_eq!(
            SkyCondition::VerticalVisibility { height_ft: None }.to_string(),
            "VV///"
        );
    }

    #[test]
    fn test_altimeter_units() {
        assert!((Altimeter::InchesHg(3034).inches_hg() - 30.34).abs() < 1e-9);
        assert!((Altimeter::Hectopascals(1013).inches_hg() - 29.91).abs() < 0.01);
        assert_eq!(Altimeter::Hectopascals(998).to_string(), "Q0998");
    }
}
