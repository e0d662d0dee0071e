//! Degrees-minutes-seconds tokens as used in the AIP coordinate lists.
//!
//! A token is `DDMMSSH` (latitude or two-digit longitude) where `H` is the
//! hemisphere letter. Longer tokens lose their first character (a sign or
//! line index), except longitudes written as `DDDMMSSH` with a leading `0` or
//! `1`. Below 100° that form reads the same either way.

use crate::utils::error::{CoordBufferError, Result};
use regex::Regex;
use std::sync::LazyLock;

static DMS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}[NSEW]$").expect("valid DMS pattern"));

static DMS_LONGITUDE_WIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[01]\d{6}[EW]$").expect("valid DMS pattern"));

/// Reprojection noise below this many arc-seconds snaps to the whole second.
const SNAP_TOLERANCE_SECONDS: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'N' => Some(Self::North),
            'S' => Some(Self::South),
            'E' => Some(Self::East),
            'W' => Some(Self::West),
            _ => None,
        }
    }

    pub fn is_latitude(&self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    fn sign(&self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// Parses a token into its hemisphere and signed decimal degrees.
pub fn decode_with_hemisphere(token: &str) -> Result<(Hemisphere, f64)> {
    let token = token.trim();
    if !token.is_ascii() {
        return Err(CoordBufferError::format(token));
    }

    let (body, degree_digits) = if DMS_LONGITUDE_WIDE.is_match(token) {
        (token, 3)
    } else if token.len() > 7 {
        // 開頭多一個字元（符號或序號）時直接丟棄
        (&token[1..], 2)
    } else {
        (token, 2)
    };

    if degree_digits == 2 && !DMS_TOKEN.is_match(body) {
        return Err(CoordBufferError::format(token));
    }

    let parse = |range: std::ops::Range<usize>| -> Result<u32> {
        body[range]
            .parse::<u32>()
            .map_err(|_| CoordBufferError::format(token))
    };
    let degrees = parse(0..degree_digits)?;
    let minutes = parse(degree_digits..degree_digits + 2)?;
    let seconds = parse(degree_digits + 2..degree_digits + 4)?;

    if degrees > 359 || minutes > 59 || seconds > 59 {
        return Err(CoordBufferError::format(format!(
            "{} (component out of range)",
            token
        )));
    }

    let hemisphere = body
        .chars()
        .last()
        .and_then(Hemisphere::from_char)
        .ok_or_else(|| CoordBufferError::format(token))?;

    let dd = degrees as f64 + minutes as f64 / 60.0 + seconds as f64 / 3600.0;
    Ok((hemisphere, hemisphere.sign() * dd))
}

pub fn decode(token: &str) -> Result<f64> {
    decode_with_hemisphere(token).map(|(_, dd)| dd)
}

/// Splits |value| into whole degrees, minutes and seconds, truncating.
fn split(value: f64) -> (u64, u64, u64) {
    let abs = value.abs();

    let total = abs * 3600.0;
    let nearest = total.round();
    if (total - nearest).abs() < SNAP_TOLERANCE_SECONDS {
        let whole = nearest as u64;
        return (whole / 3600, (whole % 3600) / 60, whole % 60);
    }

    let degrees = abs.floor();
    let minutes = (abs - degrees) * 60.0;
    let seconds = (minutes - minutes.floor()) * 60.0;
    (degrees as u64, minutes.floor() as u64, seconds.floor() as u64)
}

/// `DDMMSS` without hemisphere; the sign is dropped.
pub fn encode(value: f64) -> String {
    let (d, m, s) = split(value);
    format!("{:02}{:02}{:02}", d, m, s)
}

fn encode_longitude(value: f64) -> String {
    let (d, m, s) = split(value);
    format!("{:03}{:02}{:02}", d, m, s)
}

/// `"DDMMSSH DDDMMSSH"`, hemisphere letters chosen by sign.
pub fn format_pair(lat: f64, lon: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if lon >= 0.0 { 'E' } else { 'W' };
    format!(
        "{}{} {}{}",
        encode(lat),
        lat_dir,
        encode_longitude(lon),
        lon_dir
    )
}
