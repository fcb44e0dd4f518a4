use std::ops::RangeInclusive;

pub mod types;

pub use types::{
    Area, ClassificationRecord, DatasetKind, InstitutionRecord, LifecycleRecord, Metric,
    OverseasRecord, PatentRecord, Record,
};

/// Years the dashboard covers; records outside are never emitted.
pub const VALID_YEARS: RangeInclusive<i32> = 2019..=2022;

/// Survey year stamped on lifecycle and overseas records, whose exports
/// carry a single reference year.
pub const SURVEY_YEAR: i32 = 2020;

/// `tech_type` of integrated institution records: the exports are not broken
/// down by technology.
pub const ALL_TECH: &str = "전체";

/// Technology lifecycle stages, in order. `stage_order` is the 1-based index.
pub const LIFECYCLE_STAGES: [&str; 8] = [
    "기초연구",
    "응용연구",
    "개발연구",
    "시제품제작",
    "사업화준비",
    "시장진입",
    "시장확산",
    "성숙기",
];
