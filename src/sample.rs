// src/sample.rs
//
// Seeded placeholder datasets. Consumers fall back to these when no
// processed file exists, so every dataset always has something to render.
// Same seed, same records.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classify::{Field, Scale};
use crate::geo::REGIONS;
use crate::schema::{
    ClassificationRecord, InstitutionRecord, LifecycleRecord, OverseasRecord, PatentRecord,
    Record, LIFECYCLE_STAGES, VALID_YEARS,
};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Technologies whose counts are boosted in patent and overseas samples.
const POPULAR_TECHS: [&str; 4] = ["태양광", "전기차", "스마트그리드", "배터리"];

/// A record type with a synthetic generator.
pub trait Synthesize: Record {
    fn synthesize(rng: &mut StdRng) -> Vec<Self>;
}

/// Generate the placeholder dataset for `R` from `seed`.
pub fn synthesize<R: Synthesize>(seed: u64) -> Vec<R> {
    let mut rng = StdRng::seed_from_u64(seed);
    R::synthesize(&mut rng)
}

/// Normal deviate via Box-Muller.
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn field_weight(field: Field) -> f64 {
    match field {
        Field::Reduction => 1.2,
        Field::Adaptation => 1.0,
        _ => 0.9,
    }
}

/// Mean and deviation of (revenue, employees, rd_cost, researchers) per scale.
fn scale_profile(scale: Scale) -> [(f64, f64); 4] {
    match scale {
        Scale::Large => [(50000.0, 15000.0), (500.0, 150.0), (2000.0, 600.0), (50.0, 15.0)],
        Scale::Medium => [(15000.0, 5000.0), (150.0, 50.0), (600.0, 200.0), (20.0, 8.0)],
        Scale::Small => [(3000.0, 1000.0), (30.0, 10.0), (150.0, 50.0), (5.0, 2.0)],
        Scale::Research => [(8000.0, 2000.0), (100.0, 30.0), (4000.0, 1000.0), (80.0, 20.0)],
        // startups
        Scale::Other => [(500.0, 200.0), (15.0, 5.0), (100.0, 30.0), (8.0, 3.0)],
    }
}

const INSTITUTION_TECHS: [&str; 9] = [
    "재생에너지",
    "비재생에너지",
    "에너지효율",
    "수송",
    "에너지저장",
    "물관리",
    "농업",
    "해양수산",
    "ICT융합",
];

impl Synthesize for InstitutionRecord {
    /// Base values are drawn once per (scale, field, technology) and scaled
    /// per year around 2020: revenue and researchers move 10% a year,
    /// employees 5%, R&D cost 15%.
    fn synthesize(rng: &mut StdRng) -> Vec<Self> {
        let fields = [Field::Reduction, Field::Adaptation, Field::Convergence];
        let mut out = Vec::new();
        for scale in Scale::ALL {
            for field in fields {
                for tech in INSTITUTION_TECHS {
                    let [rev, emp, rd, res] = scale_profile(scale);
                    let w = field_weight(field);
                    let revenue = normal(rng, rev.0, rev.1) * w;
                    let employees = normal(rng, emp.0, emp.1) * w;
                    let rd_cost = normal(rng, rd.0, rd.1) * w;
                    let researchers = normal(rng, res.0, res.1) * w;

                    for year in VALID_YEARS {
                        let step = (year - 2020) as f64;
                        out.push(InstitutionRecord {
                            year,
                            field,
                            scale,
                            tech_type: tech.to_string(),
                            revenue: round1((revenue * (1.0 + 0.10 * step)).max(0.0)),
                            employees: (employees * (1.0 + 0.05 * step)).trunc().max(1.0),
                            researchers: (researchers * (1.0 + 0.10 * step)).trunc().max(1.0),
                            rd_cost: round1((rd_cost * (1.0 + 0.15 * step)).max(0.0)),
                        });
                    }
                }
            }
        }
        out
    }
}

/// (field, category, technologies)
const PATENT_TECHS: &[(Field, &str, &[&str])] = &[
    (Field::Reduction, "재생에너지", &["태양광", "풍력", "수력", "지열", "바이오매스"]),
    (Field::Reduction, "비재생에너지", &["원자력", "CCUS", "청정석탄"]),
    (Field::Reduction, "에너지효율", &["건물효율", "산업효율", "LED조명"]),
    (Field::Reduction, "수송", &["전기차", "수소차", "바이오연료"]),
    (Field::Reduction, "에너지저장", &["배터리", "수소저장", "압축공기"]),
    (Field::Adaptation, "물관리", &["홍수방어", "가뭄대응", "수자원관리"]),
    (Field::Adaptation, "농업", &["스마트팜", "기후적응작물", "정밀농업"]),
    (Field::Adaptation, "해양수산", &["해수면상승대응", "수산업적응"]),
    (Field::Adaptation, "생태계", &["생물다양성보전", "생태계복원"]),
    (Field::Adaptation, "건강", &["폭염대응", "감염병대응"]),
    (Field::Convergence, "ICT융합", &["스마트그리드", "AI기후예측", "IoT모니터링"]),
    (Field::Convergence, "바이오융합", &["바이오에너지", "바이오소재"]),
    (Field::Convergence, "나노융합", &["나노태양전지", "나노필터"]),
];

impl Synthesize for PatentRecord {
    fn synthesize(rng: &mut StdRng) -> Vec<Self> {
        let mut out = Vec::new();
        for year in VALID_YEARS {
            let growth = 1.0 + 0.1 * (year - VALID_YEARS.start()) as f64;
            for (field, category, techs) in PATENT_TECHS {
                let field_weight = match field {
                    Field::Reduction => 1.5,
                    Field::Convergence => 1.2,
                    _ => 1.0,
                };
                for tech in *techs {
                    let base: u64 = rng.gen_range(10..200);
                    let popular = if POPULAR_TECHS.contains(tech) { 2.0 } else { 1.0 };
                    out.push(PatentRecord {
                        year,
                        field: *field,
                        category: category.to_string(),
                        tech_name: tech.to_string(),
                        patent_count: (base as f64 * growth * field_weight * popular) as u64,
                    });
                }
            }
        }
        out
    }
}

const LIFECYCLE_TECHS: &[(Field, &[&str])] = &[
    (Field::Reduction, &["태양광", "풍력", "전기차", "배터리", "수소", "CCUS", "원자력"]),
    (Field::Adaptation, &["스마트팜", "홍수방어", "가뭄대응", "기후예측", "생태복원"]),
    (Field::Convergence, &["스마트그리드", "AI기후", "IoT센서", "바이오융합"]),
];

/// Share of projects per lifecycle stage for `tech` in `year`. Mature
/// technologies lean late, emerging ones early, and every year shifts weight
/// from the first four stages to the last four.
pub fn stage_distribution(tech: &str, year: i32) -> [f64; 8] {
    const MATURE: [&str; 3] = ["태양광", "풍력", "스마트팜"];
    const EMERGING: [&str; 4] = ["수소", "CCUS", "AI기후", "IoT센서"];

    let mut weights = if MATURE.contains(&tech) {
        [0.05, 0.08, 0.12, 0.15, 0.20, 0.25, 0.10, 0.05]
    } else if EMERGING.contains(&tech) {
        [0.25, 0.20, 0.18, 0.15, 0.12, 0.07, 0.02, 0.01]
    } else {
        [0.10, 0.15, 0.20, 0.20, 0.15, 0.12, 0.06, 0.02]
    };

    let shift = (year - VALID_YEARS.start()) as f64 * 0.05;
    for (i, w) in weights.iter_mut().enumerate() {
        *w = if i < 4 {
            (*w - shift).max(0.0)
        } else {
            (*w + shift / 4.0).min(1.0)
        };
    }

    let total: f64 = weights.iter().sum();
    weights.map(|w| w / total)
}

impl Synthesize for LifecycleRecord {
    fn synthesize(rng: &mut StdRng) -> Vec<Self> {
        let mut out = Vec::new();
        for year in VALID_YEARS {
            for (field, techs) in LIFECYCLE_TECHS {
                for tech in *techs {
                    let weights = stage_distribution(tech, year);
                    for (i, stage) in LIFECYCLE_STAGES.iter().enumerate() {
                        let total: u64 = rng.gen_range(20..100);
                        out.push(LifecycleRecord {
                            year,
                            field: *field,
                            tech_name: tech.to_string(),
                            lifecycle_stage: stage.to_string(),
                            stage_order: i as u32 + 1,
                            project_count: (total as f64 * weights[i]) as u64,
                        });
                    }
                }
            }
        }
        out
    }
}

const OVERSEAS_TECHS: &[(Field, &[&str])] = &[
    (Field::Reduction, &["태양광", "풍력", "전기차", "배터리", "수소", "ESS"]),
    (Field::Adaptation, &["스마트팜", "물관리", "기후예측", "방재시스템"]),
    (Field::Convergence, &["스마트그리드", "AI기후", "그린빌딩", "스마트시티"]),
];

impl Synthesize for OverseasRecord {
    fn synthesize(rng: &mut StdRng) -> Vec<Self> {
        let mut out = Vec::new();
        for year in VALID_YEARS {
            let growth = 1.0 + 0.15 * (year - VALID_YEARS.start()) as f64;
            for region in REGIONS {
                for (field, techs) in OVERSEAS_TECHS {
                    for tech in *techs {
                        let base: u64 = rng.gen_range(5..50);
                        let popular = if POPULAR_TECHS.contains(tech) { 1.5 } else { 1.0 };
                        let weighted = (base as f64 * region.weight * popular).trunc();
                        out.push(OverseasRecord {
                            year,
                            region: region.name.to_string(),
                            field: *field,
                            tech_name: tech.to_string(),
                            export_count: (weighted * growth) as u64,
                            latitude: region.latitude,
                            longitude: region.longitude,
                            countries: region.countries_text(),
                        });
                    }
                }
            }
        }
        out
    }
}

/// Reference taxonomy: (L1, L2, L3).
const TAXONOMY: [(&str, &str, &str); 22] = [
    ("감축", "재생에너지", "태양광 발전"),
    ("감축", "재생에너지", "풍력 발전"),
    ("감축", "재생에너지", "수력 발전"),
    ("감축", "재생에너지", "지열 발전"),
    ("감축", "재생에너지", "바이오매스"),
    ("감축", "비재생에너지", "원자력 발전"),
    ("감축", "비재생에너지", "CCUS"),
    ("감축", "에너지효율", "건물 에너지"),
    ("감축", "에너지효율", "산업 효율"),
    ("감축", "수송", "전기차"),
    ("감축", "수송", "수소차"),
    ("감축", "에너지저장", "배터리 저장"),
    ("감축", "에너지저장", "수소 저장"),
    ("적응", "물관리", "홍수 방어"),
    ("적응", "물관리", "가뭄 대응"),
    ("적응", "농업", "스마트팜"),
    ("적응", "농업", "기후적응 작물"),
    ("적응", "해양수산", "해수면 상승 대응"),
    ("적응", "생태계", "생물다양성 보전"),
    ("적응", "건강", "폭염 대응"),
    ("융복합", "ICT 융합", "스마트그리드"),
    ("융복합", "ICT 융합", "AI 기후예측"),
];

impl Synthesize for ClassificationRecord {
    /// Fixed; the seed is ignored.
    fn synthesize(_rng: &mut StdRng) -> Vec<Self> {
        TAXONOMY
            .iter()
            .enumerate()
            .map(|(i, (l1, l2, l3))| ClassificationRecord {
                level1: l1.to_string(),
                level2: l2.to_string(),
                level3: l3.to_string(),
                no: i as u32 + 1,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_csv_bytes;
    use anyhow::Result;

    #[test]
    fn same_seed_same_bytes() -> Result<()> {
        assert_eq!(
            to_csv_bytes(&synthesize::<InstitutionRecord>(DEFAULT_SEED))?,
            to_csv_bytes(&synthesize::<InstitutionRecord>(DEFAULT_SEED))?
        );
        assert_eq!(
            to_csv_bytes(&synthesize::<PatentRecord>(DEFAULT_SEED))?,
            to_csv_bytes(&synthesize::<PatentRecord>(DEFAULT_SEED))?
        );
        assert_eq!(
            to_csv_bytes(&synthesize::<LifecycleRecord>(DEFAULT_SEED))?,
            to_csv_bytes(&synthesize::<LifecycleRecord>(DEFAULT_SEED))?
        );
        assert_eq!(
            to_csv_bytes(&synthesize::<OverseasRecord>(DEFAULT_SEED))?,
            to_csv_bytes(&synthesize::<OverseasRecord>(DEFAULT_SEED))?
        );
        Ok(())
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(synthesize::<PatentRecord>(1), synthesize::<PatentRecord>(2));
    }

    #[test]
    fn samples_cover_every_valid_year() {
        fn years<R: Record>(records: &[R]) -> Vec<i32> {
            let mut ys: Vec<i32> = records.iter().filter_map(|r| r.year()).collect();
            ys.sort_unstable();
            ys.dedup();
            ys
        }
        let all: Vec<i32> = VALID_YEARS.collect();
        assert_eq!(years(&synthesize::<InstitutionRecord>(DEFAULT_SEED)), all);
        assert_eq!(years(&synthesize::<PatentRecord>(DEFAULT_SEED)), all);
        assert_eq!(years(&synthesize::<LifecycleRecord>(DEFAULT_SEED)), all);
        assert_eq!(years(&synthesize::<OverseasRecord>(DEFAULT_SEED)), all);
    }

    #[test]
    fn institution_sample_is_full_cross_product() {
        let records = synthesize::<InstitutionRecord>(DEFAULT_SEED);
        assert_eq!(records.len(), Scale::ALL.len() * 3 * INSTITUTION_TECHS.len() * 4);
        assert!(records.iter().all(|r| r.revenue >= 0.0 && r.rd_cost >= 0.0));
        assert!(records.iter().all(|r| r.employees >= 1.0 && r.researchers >= 1.0));
    }

    #[test]
    fn overseas_sample_uses_region_table() {
        let records = synthesize::<OverseasRecord>(DEFAULT_SEED);
        assert_eq!(records.len(), 4 * REGIONS.len() * 14);
        let oceania = records
            .iter()
            .find(|r| r.region == "오세아니아")
            .expect("oceania present");
        assert_eq!((oceania.latitude, oceania.longitude), (-25.0, 140.0));
        assert_eq!(oceania.countries, "호주, 뉴질랜드");
    }

    #[test]
    fn stage_distribution_is_normalized_and_drifts_late() {
        for tech in ["태양광", "수소", "전기차"] {
            for year in VALID_YEARS {
                let total: f64 = stage_distribution(tech, year).iter().sum();
                assert!((total - 1.0).abs() < 1e-9);
            }
        }
        let early: f64 = stage_distribution("전기차", 2019)[4..].iter().sum();
        let late: f64 = stage_distribution("전기차", 2022)[4..].iter().sum();
        assert!(late > early);
    }

    #[test]
    fn classification_sample_is_fixed() {
        let a = synthesize::<ClassificationRecord>(1);
        let b = synthesize::<ClassificationRecord>(2);
        assert_eq!(a, b);
        assert_eq!(a.len(), 22);
        assert_eq!(a[21].no, 22);
        assert_eq!(a[20].field(), Field::Convergence);
    }
}
