use serde::{Deserialize, Serialize};

use super::RecordId;

/// Cast and crew for a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    pub id: RecordId,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
    pub profile_path: Option<String>,
}

impl Credits {
    /// Cast members in billing order.
    pub fn top_billed(&self, limit: usize) -> Vec<&CastMember> {
        let mut cast: Vec<&CastMember> = self.cast.iter().collect();
        cast.sort_by_key(|c| c.order);
        cast.truncate(limit);
        cast
    }

    pub fn directors(&self) -> Vec<&CrewMember> {
        self.crew
            .iter()
            .filter(|c| c.job.as_deref() == Some("Director"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast(id: i64, order: u32) -> CastMember {
        CastMember {
            id,
            name: format!("Actor {}", id),
            character: None,
            profile_path: None,
            order,
        }
    }

    #[test]
    fn test_top_billed_sorts_by_order() {
        let credits = Credits {
            id: 1,
            cast: vec![cast(10, 2), cast(11, 0), cast(12, 1)],
            crew: vec![],
        };
        let ids: Vec<i64> = credits.top_billed(2).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11, 12]);
    }

    #[test]
    fn test_directors_filters_by_job() {
        let credits = Credits {
            id: 1,
            cast: vec![],
            crew: vec![
                CrewMember {
                    id: 1,
                    name: "A".into(),
                    job: Some("Director".into()),
                    department: Some("Directing".into()),
                    profile_path: None,
                },
                CrewMember {
                    id: 2,
                    name: "B".into(),
                    job: Some("Writer".into()),
                    department: Some("Writing".into()),
                    profile_path: None,
                },
            ],
        };
        assert_eq!(credits.directors().len(), 1);
    }
}
