use super::{Project, Quality};

/// Counts shown above the project table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub cir_potential: usize,
    pub cii_potential: usize,
    pub well_documented: usize,
}

impl Stats {
    pub fn from_projects(projects: &[Project]) -> Self {
        projects.iter().fold(Self::default(), |mut stats, project| {
            stats.total += 1;
            if project.kind.is_cir_potential() {
                stats.cir_potential += 1;
            }
            if project.kind.is_cii_potential() {
                stats.cii_potential += 1;
            }
            if project.quality == Quality::Excellent {
                stats.well_documented += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectType;

    fn project(id: &str, kind: ProjectType, quality: Quality) -> Project {
        let mut project = Project::with_id(id);
        project.subject = format!("subject {id}");
        project.kind = kind;
        project.quality = quality;
        project
    }

    #[test]
    fn empty_collection_has_zero_counts() {
        assert_eq!(Stats::from_projects(&[]), Stats::default());
    }

    #[test]
    fn mixte_projects_count_toward_both_credits() {
        let projects = vec![
            project("1", ProjectType::Cir, Quality::Faible),
            project("2", ProjectType::Cii, Quality::Excellent),
            project("3", ProjectType::Mixte, Quality::Moyen),
            project("4", ProjectType::Incertain, Quality::Excellent),
        ];

        let stats = Stats::from_projects(&projects);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.cir_potential, 2);
        assert_eq!(stats.cii_potential, 2);
        assert_eq!(stats.well_documented, 2);
    }
}
