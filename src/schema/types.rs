// src/schema/types.rs

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::classify::{classify_field, Field, Scale};

/// The processed datasets handed to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Institution,
    Patent,
    Lifecycle,
    Overseas,
    Classification,
}

/// Which data directory a dataset's output lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Processed,
    Scraped,
}

impl DatasetKind {
    pub const PROCESSED: [DatasetKind; 4] = [
        DatasetKind::Institution,
        DatasetKind::Patent,
        DatasetKind::Lifecycle,
        DatasetKind::Overseas,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Institution => "institution",
            DatasetKind::Patent => "patent",
            DatasetKind::Lifecycle => "lifecycle",
            DatasetKind::Overseas => "overseas",
            DatasetKind::Classification => "classification",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetKind::Institution => "institution_data.csv",
            DatasetKind::Patent => "patent_data.csv",
            DatasetKind::Lifecycle => "lifecycle_data.csv",
            DatasetKind::Overseas => "overseas_data.csv",
            DatasetKind::Classification => "climate_tech_classification.csv",
        }
    }

    pub fn area(&self) -> Area {
        match self {
            DatasetKind::Classification => Area::Scraped,
            _ => Area::Processed,
        }
    }

    /// Raw files deposited by the collector that feed this dataset.
    pub fn raw_files(&self) -> Vec<&'static str> {
        match self {
            DatasetKind::Institution => Metric::ALL.iter().map(|m| m.raw_file()).collect(),
            DatasetKind::Patent => vec!["patent_data.csv"],
            DatasetKind::Lifecycle => vec!["lifecycle_data.csv"],
            DatasetKind::Overseas => vec!["overseas_data.csv"],
            DatasetKind::Classification => Vec::new(),
        }
    }

    /// Korean description shown next to the file in status listings.
    pub fn description(&self) -> &'static str {
        match self {
            DatasetKind::Institution => "기관 현황",
            DatasetKind::Patent => "특허 현황",
            DatasetKind::Lifecycle => "수명주기",
            DatasetKind::Overseas => "해외진출",
            DatasetKind::Classification => "기후기술 분류체계",
        }
    }
}

/// Institution metrics, in the order their files are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Revenue,
    Employees,
    Researchers,
    RdCost,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Revenue,
        Metric::Employees,
        Metric::Researchers,
        Metric::RdCost,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Employees => "employees",
            Metric::Researchers => "researchers",
            Metric::RdCost => "rd_cost",
        }
    }

    pub fn raw_file(&self) -> &'static str {
        match self {
            Metric::Revenue => "institution_revenue.csv",
            Metric::Employees => "institution_employees.csv",
            Metric::Researchers => "institution_researchers.csv",
            Metric::RdCost => "institution_rd_cost.csv",
        }
    }
}

/// A row type persisted as one processed CSV file.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: DatasetKind;

    /// Column header, in serialization order.
    fn columns() -> &'static [&'static str];

    /// Reference year, for datasets that have one.
    fn year(&self) -> Option<i32>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub year: i32,
    pub field: Field,
    pub scale: Scale,
    pub tech_type: String,
    pub revenue: f64,
    pub employees: f64,
    pub researchers: f64,
    pub rd_cost: f64,
}

impl InstitutionRecord {
    pub fn set_metric(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Revenue => self.revenue = value,
            Metric::Employees => self.employees = value,
            Metric::Researchers => self.researchers = value,
            Metric::RdCost => self.rd_cost = value,
        }
    }
}

impl Record for InstitutionRecord {
    const KIND: DatasetKind = DatasetKind::Institution;

    fn columns() -> &'static [&'static str] {
        &[
            "year",
            "field",
            "scale",
            "tech_type",
            "revenue",
            "employees",
            "researchers",
            "rd_cost",
        ]
    }

    fn year(&self) -> Option<i32> {
        Some(self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub year: i32,
    pub field: Field,
    pub category: String,
    pub tech_name: String,
    pub patent_count: u64,
}

impl Record for PatentRecord {
    const KIND: DatasetKind = DatasetKind::Patent;

    fn columns() -> &'static [&'static str] {
        &["year", "field", "category", "tech_name", "patent_count"]
    }

    fn year(&self) -> Option<i32> {
        Some(self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub year: i32,
    pub field: Field,
    pub tech_name: String,
    pub lifecycle_stage: String,
    pub stage_order: u32,
    pub project_count: u64,
}

impl Record for LifecycleRecord {
    const KIND: DatasetKind = DatasetKind::Lifecycle;

    fn columns() -> &'static [&'static str] {
        &[
            "year",
            "field",
            "tech_name",
            "lifecycle_stage",
            "stage_order",
            "project_count",
        ]
    }

    fn year(&self) -> Option<i32> {
        Some(self.year)
    }
}

/// Overseas expansion count. `latitude`, `longitude` and `countries` come from
/// the region table and are map annotations, not measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverseasRecord {
    pub year: i32,
    pub region: String,
    pub field: Field,
    pub tech_name: String,
    pub export_count: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub countries: String,
}

impl Record for OverseasRecord {
    const KIND: DatasetKind = DatasetKind::Overseas;

    fn columns() -> &'static [&'static str] {
        &[
            "year",
            "region",
            "field",
            "tech_name",
            "export_count",
            "latitude",
            "longitude",
            "countries",
        ]
    }

    fn year(&self) -> Option<i32> {
        Some(self.year)
    }
}

/// One leaf of the climate-technology taxonomy, as the collector scrapes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "L1_대분류")]
    pub level1: String,
    #[serde(rename = "L2_중분류")]
    pub level2: String,
    #[serde(rename = "L3_소분류")]
    pub level3: String,
    #[serde(rename = "No")]
    pub no: u32,
}

impl ClassificationRecord {
    pub fn field(&self) -> Field {
        classify_field(&self.level1)
    }
}

impl Record for ClassificationRecord {
    const KIND: DatasetKind = DatasetKind::Classification;

    fn columns() -> &'static [&'static str] {
        &["L1_대분류", "L2_중분류", "L3_소분류", "No"]
    }

    fn year(&self) -> Option<i32> {
        None
    }
}
