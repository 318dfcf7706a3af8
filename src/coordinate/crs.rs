//! Coordinate Reference System handling

use crate::errors::{ExtractError, ExtractResult};

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    format!("UTM Zone {}N (EPSG:{})", zone, self.epsg_code())
                } else {
                    format!("UTM Zone {}S (EPSG:{})", zone, self.epsg_code())
                }
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }

    /// PROJ.4 definition from the EPSG database, if the code is known
    pub fn proj_string(&self) -> Option<&'static str> {
        u16::try_from(self.epsg_code()).ok()
            .and_then(crs_definitions::from_code)
            .map(|def| def.proj4)
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(definition) => definition.contains("+proj=longlat"),
            None => matches!(self, CoordinateSystem::WGS84),
        }
    }
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> CoordinateSystem {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Parse a coordinate system from a string
    ///
    /// Accepts `EPSG:4326`, a bare code, the OGC URN form used by GeoJSON
    /// (`urn:ogc:def:crs:EPSG::3857`) and `OGC:CRS84`.
    pub fn from_string(crs_str: &str) -> ExtractResult<CoordinateSystem> {
        let crs_str = crs_str.trim().to_uppercase();

        if crs_str.ends_with("CRS84") {
            return Ok(CoordinateSystem::WGS84);
        }

        let code = if let Some(code) = crs_str.strip_prefix("EPSG:") {
            code
        } else if let Some(pos) = crs_str.rfind("EPSG:") {
            // URN form: everything after the last ':'
            crs_str[pos..].rsplit(':').next().unwrap_or("")
        } else {
            crs_str.as_str()
        };

        code.parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| ExtractError::InvalidInput(format!("Unsupported CRS format: {}", crs_str)))
    }
}
