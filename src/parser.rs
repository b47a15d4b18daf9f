//! Decoder for METAR/SPECI surface weather observations.
//!
//! A report is a line of whitespace-separated groups in a fixed order,
//! several of which are optional:
//!
//! ```text
//! [METAR|SPECI] STATION DDHHMMZ [AUTO|COR] WIND [VARIANCE] VISIBILITY
//!     [WEATHER...] [SKY...] [TEMP/DEW] [ALTIMETER] [RMK ...]
//! ```
//!
//! Example:
//! ```text
//! METAR KJFK 250251Z 21010G18KT 180V240 1 5/16SM -RA BR BKN043 19/09 A3034 RMK AO2
//! ```
//!
//! The line is split into tokens once and walked by a [`Decoder`] holding a
//! cursor that only moves forward. Each step peeks at the token under the
//! cursor and consumes it only if it matches the group being decoded. The
//! grammar of each individual group is a small `nom` parser that must
//! consume the whole token.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_opt, map_res, opt, value},
    sequence::{preceded, separated_pair, terminated},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::report::{
    Altimeter, Celsius, ClearSky, CloudType, DirectionalVariance, ObservationTime, Report, ReportKind,
    RespectModifier, SkyCondition, SkyCover, StatuteMiles, Temperature, Visibility, Wind,
};
use crate::weather::{WeatherPhenomenon, parse_weather};

/// Errors that can occur while decoding a report.
///
/// Every variant carries the offending token or span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed observation time: {0:?}")]
    MalformedTime(String),

    #[error("Missing or malformed wind group: {0:?}")]
    MissingWindGroup(Option<String>),

    #[error("Report truncated while decoding {field}: {span:?}")]
    TruncatedReport { field: &'static str, span: String },

    #[error("Invalid visibility: {0:?}")]
    InvalidVisibility(String),

    #[error("Invalid directional variance: {0:?}")]
    InvalidVariance(String),

    #[error("Directional variance {0:?} follows a calm or variable wind")]
    UnexpectedVariance(String),

    #[error("Unrecognized weather group: {0:?}")]
    UnrecognizedWeather(String),

    #[error("Unexpected token: {0:?}")]
    UnexpectedToken(String),
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// How to treat groups the decoder does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Unrecognized weather codes decode to an empty phenomenon and stray
    /// tokens before the remarks are kept in [`Report::unparsed`].
    #[default]
    Lenient,
    /// Every weather token must decode completely and no stray tokens are allowed.
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub mode: DecodeMode,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            mode: DecodeMode::Strict,
        }
    }
}

/// Split a report line into tokens on runs of whitespace.
pub fn tokenize(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn digits<'a, T: std::str::FromStr>(
    min: usize,
    max: usize,
) -> impl Parser<&'a str, Output = T, Error = nom::error::Error<&'a str>> {
    map_res(take_while_m_n(min, max, is_digit), |s: &str| s.parse::<T>())
}

/// `DDHHMMZ`. Only the digit pattern is checked, not the calendar.
fn parse_time(input: &str) -> IResult<&str, ObservationTime> {
    all_consuming(map(
        terminated(
            (digits::<u8>(2, 2), digits::<u8>(2, 2), digits::<u8>(2, 2)),
            char('Z'),
        ),
        |(day, hour, minute)| ObservationTime { day, hour, minute },
    ))
    .parse(input)
}

/// A three-digit heading of at most 360 degrees.
fn parse_heading(input: &str) -> IResult<&str, u16> {
    map_opt(digits::<u16>(3, 3), |d| (d <= 360).then_some(d)).parse(input)
}

/// Wind group: `00000KT`, or heading/`VRB` + speed + optional gust + `KT`.
fn parse_wind(input: &str) -> IResult<&str, Wind> {
    let direction = alt((value(None, tag("VRB")), map(parse_heading, Some)));
    let gust = opt(preceded(char('G'), digits::<u16>(2, 3)));

    all_consuming(alt((
        value(Wind::Calm, tag("00000KT")),
        map(
            terminated((direction, digits::<u16>(2, 3), gust), tag("KT")),
            |(direction, speed_knots, gust_knots)| match direction {
                None => Wind::Variable {
                    speed_knots,
                    gust_knots,
                },
                Some(degrees) => Wind::Heading {
                    degrees,
                    speed_knots,
                    gust_knots,
                    variance: None,
                },
            },
        ),
    )))
    .parse(input)
}

/// `dddVddd`. Range checking is left to the caller so it can report it.
fn parse_variance(input: &str) -> IResult<&str, DirectionalVariance> {
    all_consuming(map(
        separated_pair(digits::<u16>(3, 3), char('V'), digits::<u16>(3, 3)),
        |(from, to)| DirectionalVariance { from, to },
    ))
    .parse(input)
}

/// Parse an unsigned decimal number.
fn parse_number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>()).parse(input)
}

/// Parse a `n/d` fraction into its numerator and denominator.
fn parse_fraction(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(parse_number, char('/'), parse_number).parse(input)
}

/// An assembled visibility span: optional `M`, then an integer, a fraction
/// or a mixed number, then `SM`.
fn parse_visibility(input: &str) -> IResult<&str, Visibility> {
    let integer = map(parse_number, StatuteMiles::whole);
    let fraction = map_opt(parse_fraction, |(n, d)| StatuteMiles::new(n, d));
    let mixed = map_opt(
        separated_pair(parse_number, char(' '), parse_fraction),
        |(whole, (n, d))| StatuteMiles::mixed(whole, n, d),
    );

    all_consuming(map(
        (
            opt(char('M')),
            alt((
                terminated(integer, tag("SM")),
                terminated(fraction, tag("SM")),
                terminated(mixed, tag("SM")),
            )),
        ),
        |(less_than, distance)| Visibility {
            distance,
            less_than: less_than.is_some(),
        },
    ))
    .parse(input)
}

/// Parse a three-digit height in hundreds of feet.
fn parse_cloud_height(input: &str) -> IResult<&str, u32> {
    map(digits::<u32>(3, 3), |hundreds| hundreds * 100).parse(input)
}

/// Parse a sky condition group: `CLR`, `BKN043CB` or `VV002`.
fn parse_sky(input: &str) -> IResult<&str, SkyCondition> {
    let clear = alt((
        value(ClearSky::Clear, tag("CLR")),
        value(ClearSky::SkyClear, tag("SKC")),
        value(ClearSky::NoSignificantCloud, tag("NSC")),
        value(ClearSky::NoCloudDetected, tag("NCD")),
    ));
    let cover = alt((
        value(SkyCover::Few, tag("FEW")),
        value(SkyCover::Scattered, tag("SCT")),
        value(SkyCover::Broken, tag("BKN")),
        value(SkyCover::Overcast, tag("OVC")),
    ));
    let cloud = alt((
        value(CloudType::Cumulonimbus, tag("CB")),
        value(CloudType::ToweringCumulus, tag("TCU")),
    ));
    let vertical = preceded(
        tag("VV"),
        alt((value(None, tag("///")), map(parse_cloud_height, Some))),
    );

    all_consuming(alt((
        map(clear, SkyCondition::Clear),
        map(
            (cover, parse_cloud_height, opt(cloud)),
            |(cover, height_ft, cloud)| SkyCondition::Layer {
                cover,
                height_ft,
                cloud,
            },
        ),
        map(vertical, |height_ft| SkyCondition::VerticalVisibility { height_ft }),
    )))
    .parse(input)
}

/// Parse a two-digit Celsius reading with an optional `M` sign.
fn parse_celsius(input: &str) -> IResult<&str, Celsius> {
    map((opt(char('M')), digits::<u8>(2, 2)), |(minus, degrees)| {
        Celsius::new(minus.is_some(), degrees)
    })
    .parse(input)
}

/// `19/09`, `M03/M10` or `19/` when the dew point is missing.
fn parse_temperature(input: &str) -> IResult<&str, Temperature> {
    all_consuming(map(
        separated_pair(parse_celsius, char('/'), opt(parse_celsius)),
        |(air_c, dew_point_c)| Temperature { air_c, dew_point_c },
    ))
    .parse(input)
}

/// Parse an altimeter group: `A3034` (inHg) or `Q1013` (hPa).
fn parse_altimeter(input: &str) -> IResult<&str, Altimeter> {
    all_consuming(alt((
        map(preceded(char('A'), digits::<u16>(4, 4)), Altimeter::InchesHg),
        map(preceded(char('Q'), digits::<u16>(4, 4)), Altimeter::Hectopascals),
    )))
    .parse(input)
}

const REMARKS: &str = "RMK";

/// True if the token opens one of the groups that follow the weather run.
fn begins_trailing_group(token: &str) -> bool {
    token == REMARKS
        || parse_sky(token).is_ok()
        || parse_temperature(token).is_ok()
        || parse_altimeter(token).is_ok()
}

/// Cursor over the tokens of one report.
///
/// The token list is never modified; `pos` only moves forward.
pub struct Decoder<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a str, options: DecodeOptions) -> Self {
        Self {
            tokens: tokenize(input),
            pos: 0,
            options,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consume the next token if `parser` accepts all of it.
    fn accept<T>(&mut self, parser: fn(&str) -> IResult<&str, T>) -> Option<T> {
        let (_, parsed) = parser(self.peek()?).ok()?;
        self.pos += 1;
        Some(parsed)
    }

    /// Run every decoding step in order.
    pub fn decode(mut self) -> DecodeResult<Report> {
        trace!(tokens = self.tokens.len(), "decoding report");

        let kind = self.report_kind();
        let station = self.station()?;
        let time = self.time()?;
        let modifier = self.modifier();
        let wind = self.wind()?;
        let visibility = self.visibility()?;
        let weather = self.weather()?;

        let mut sky = Vec::new();
        while let Some(layer) = self.accept(parse_sky) {
            sky.push(layer);
        }
        let temperature = self.accept(parse_temperature);
        let altimeter = self.accept(parse_altimeter);
        let (unparsed, remarks) = self.trailing()?;

        Ok(Report {
            kind,
            station,
            time,
            modifier,
            wind,
            visibility,
            weather,
            sky,
            temperature,
            altimeter,
            remarks,
            unparsed,
        })
    }

    fn report_kind(&mut self) -> ReportKind {
        let kind = match self.peek() {
            Some("METAR") => ReportKind::Routine,
            Some("SPECI") => ReportKind::Special,
            _ => return ReportKind::Unspecified,
        };
        self.pos += 1;
        kind
    }

    fn station(&mut self) -> DecodeResult<String> {
        self.advance()
            .map(str::to_string)
            .ok_or(DecodeError::TruncatedReport {
                field: "station",
                span: String::new(),
            })
    }

    fn time(&mut self) -> DecodeResult<ObservationTime> {
        let token = self.advance().ok_or(DecodeError::TruncatedReport {
            field: "time",
            span: String::new(),
        })?;
        parse_time(token)
            .map(|(_, time)| time)
            .map_err(|_| DecodeError::MalformedTime(token.to_string()))
    }

    fn modifier(&mut self) -> RespectModifier {
        let modifier = match self.peek() {
            Some("AUTO") => RespectModifier::Automatic,
            Some("COR") => RespectModifier::Correction,
            _ => return RespectModifier::Unspecified,
        };
        self.pos += 1;
        modifier
    }

    /// Wind group plus the directional variance that may follow it.
    fn wind(&mut self) -> DecodeResult<Wind> {
        let token = self.peek().ok_or(DecodeError::MissingWindGroup(None))?;
        let (_, mut wind) =
            parse_wind(token).map_err(|_| DecodeError::MissingWindGroup(Some(token.to_string())))?;
        self.pos += 1;

        if let Some(token) = self.peek()
            && let Ok((_, range)) = parse_variance(token)
        {
            if range.from > 360 || range.to > 360 {
                return Err(DecodeError::InvalidVariance(token.to_string()));
            }
            match wind {
                Wind::Heading {
                    ref mut variance, ..
                } => *variance = Some(range),
                Wind::Calm | Wind::Variable { .. } => {
                    return Err(DecodeError::UnexpectedVariance(token.to_string()));
                }
            }
            self.pos += 1;
        }

        Ok(wind)
    }

    /// Visibility may span several tokens (`1 1/2SM`); gather tokens until
    /// the span carries the `SM` unit.
    fn visibility(&mut self) -> DecodeResult<Visibility> {
        let mut span = String::new();
        loop {
            let Some(token) = self.advance() else {
                return Err(DecodeError::TruncatedReport {
                    field: "visibility",
                    span,
                });
            };
            if !span.is_empty() {
                span.push(' ');
            }
            span.push_str(token);
            if span.ends_with("SM") {
                break;
            }
        }

        let visibility = parse_visibility(&span).ok().map(|(_, v)| v);
        visibility.ok_or(DecodeError::InvalidVisibility(span))
    }

    fn weather(&mut self) -> DecodeResult<Vec<WeatherPhenomenon>> {
        let mut groups = Vec::new();
        while let Some(token) = self.peek() {
            if begins_trailing_group(token) {
                break;
            }
            self.pos += 1;
            groups.push(self.phenomenon(token)?);
        }
        Ok(groups)
    }

    fn phenomenon(&self, token: &str) -> DecodeResult<WeatherPhenomenon> {
        let (rest, phenomenon) = parse_weather(token)
            .map_err(|_| DecodeError::UnrecognizedWeather(token.to_string()))?;

        if rest.is_empty() && !phenomenon.is_empty() {
            return Ok(phenomenon);
        }
        match self.options.mode {
            DecodeMode::Strict => Err(DecodeError::UnrecognizedWeather(token.to_string())),
            DecodeMode::Lenient => {
                debug!(token, unparsed = rest, "weather group only partially recognized");
                Ok(phenomenon)
            }
        }
    }

    /// Stray tokens up to `RMK`, then the raw remarks.
    fn trailing(&mut self) -> DecodeResult<(Vec<String>, Option<String>)> {
        let mut unparsed = Vec::new();
        while let Some(token) = self.advance() {
            if token == REMARKS {
                let remarks = self.tokens[self.pos..].join(" ");
                self.pos = self.tokens.len();
                return Ok((unparsed, Some(remarks)));
            }
            match self.options.mode {
                DecodeMode::Strict => return Err(DecodeError::UnexpectedToken(token.to_string())),
                DecodeMode::Lenient => {
                    debug!(token, "skipping unrecognized group");
                    unparsed.push(token.to_string());
                }
            }
        }
        Ok((unparsed, None))
    }
}

/// Decode a report line leniently.
///
/// # Example
///
/// ```
/// use metar_decoder::parser::decode;
/// use metar_decoder::report::{ReportKind, WindDirection};
///
/// let report = decode("METAR KJFK 250251Z 08006KT 10SM").unwrap();
/// assert_eq!(report.kind, ReportKind::Routine);
/// assert_eq!(report.station, "KJFK");
/// assert_eq!(report.wind.direction(), WindDirection::Heading(80));
/// assert_eq!(report.visibility.distance.as_f64(), 10.0);
/// ```
pub fn decode(input: &str) -> DecodeResult<Report> {
    decode_with(input, DecodeOptions::default())
}

/// Decode a report line with explicit options.
pub fn decode_with(input: &str, options: DecodeOptions) -> DecodeResult<Report> {
    Decoder::new(input, options).decode()
}

/// Check if a line could be a report (quick pre-filter).
///
/// Skips blank lines and `#` comments in batch input. Everything else goes
/// to the decoder, so truncated reports surface as decode errors.
#[inline]
pub fn looks_like_report(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}
