//! Representative coordinates for the macro-regions used in overseas data.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::process::extract::SlotLayout;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub countries: &'static [&'static str],
    /// Relative market weight, used when synthesizing placeholder data.
    pub weight: f64,
}

impl Region {
    pub fn countries_text(&self) -> String {
        self.countries.join(", ")
    }
}

pub static REGIONS: &[Region] = &[
    Region {
        name: "동남아시아",
        latitude: 10.0,
        longitude: 110.0,
        countries: &["베트남", "태국", "인도네시아", "필리핀", "말레이시아"],
        weight: 1.5,
    },
    Region {
        name: "중국",
        latitude: 35.0,
        longitude: 104.0,
        countries: &["중국"],
        weight: 2.0,
    },
    Region {
        name: "일본",
        latitude: 36.0,
        longitude: 138.0,
        countries: &["일본"],
        weight: 1.2,
    },
    Region {
        name: "유럽",
        latitude: 54.0,
        longitude: 15.0,
        countries: &["독일", "프랑스", "영국", "네덜란드"],
        weight: 1.3,
    },
    Region {
        name: "북미",
        latitude: 45.0,
        longitude: -100.0,
        countries: &["미국", "캐나다"],
        weight: 1.4,
    },
    Region {
        name: "중동",
        latitude: 25.0,
        longitude: 45.0,
        countries: &["UAE", "사우디아라비아", "카타르"],
        weight: 1.8,
    },
    Region {
        name: "남미",
        latitude: -15.0,
        longitude: -60.0,
        countries: &["브라질", "아르헨티나", "칠레"],
        weight: 0.8,
    },
    Region {
        name: "아프리카",
        latitude: 0.0,
        longitude: 20.0,
        countries: &["남아프리카공화국", "이집트", "모로코"],
        weight: 0.6,
    },
    Region {
        name: "오세아니아",
        latitude: -25.0,
        longitude: 140.0,
        countries: &["호주", "뉴질랜드"],
        weight: 0.7,
    },
];

/// Column order of regions in the overseas export, which has no region
/// header. Oceania is not part of that export.
pub const POSITIONAL_ORDER: [&str; 8] = [
    "동남아시아",
    "중국",
    "일본",
    "유럽",
    "북미",
    "중동",
    "남미",
    "아프리카",
];

static BY_NAME: Lazy<HashMap<&'static str, &'static Region>> =
    Lazy::new(|| REGIONS.iter().map(|r| (r.name, r)).collect());

/// Coordinates and countries for a region name.
pub fn lookup(name: &str) -> Option<&'static Region> {
    BY_NAME.get(name.trim()).copied()
}

/// `(latitude, longitude, countries)` for `name`, or the origin with no
/// countries for an unknown region.
pub fn lookup_or_default(name: &str) -> (f64, f64, String) {
    lookup(name)
        .map(|r| (r.latitude, r.longitude, r.countries_text()))
        .unwrap_or((0.0, 0.0, String::new()))
}

/// Region implied by a column position:
/// `POSITIONAL_ORDER[(col - offset) mod POSITIONAL_ORDER.len()]`.
pub fn region_for_column(col: usize, first_data_col: usize) -> Option<&'static Region> {
    positional_layout(first_data_col)
        .slot(col)
        .and_then(|slot| lookup(POSITIONAL_ORDER[slot]))
}

pub fn positional_layout(first_data_col: usize) -> SlotLayout {
    SlotLayout::wrapping(first_data_col, POSITIONAL_ORDER.len())
}
