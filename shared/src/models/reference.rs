//! Reference data bundle (roles, sites, beverage types)

use serde::{Deserialize, Serialize};

use super::{BeverageType, Role, Site};

/// The three small lookup collections every page needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub roles: Vec<Role>,
    pub sites: Vec<Site>,
    pub beverage_types: Vec<BeverageType>,
}

impl ReferenceData {
    pub fn role_label(&self, id: &str) -> String {
        label_or_id(self.roles.iter().map(|r| (r.id.as_str(), r.name.as_str())), id)
    }

    pub fn site_label(&self, id: &str) -> String {
        label_or_id(self.sites.iter().map(|s| (s.id.as_str(), s.name.as_str())), id)
    }

    pub fn beverage_type_label(&self, id: &str) -> String {
        label_or_id(
            self.beverage_types.iter().map(|b| (b.id.as_str(), b.name.as_str())),
            id,
        )
    }
}

/// Display name of a referenced document, or the raw id when it no longer exists
pub fn label_or_id<'a, I>(entries: I, id: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    entries
        .into_iter()
        .find(|(entry_id, _)| *entry_id == id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn site(id: &str, name: &str) -> Site {
        Site {
            id: id.into(),
            name: name.into(),
            address: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_label_resolves_name() {
        let data = ReferenceData {
            sites: vec![site("GDL", "Guadalajara")],
            ..Default::default()
        };
        assert_eq!(data.site_label("GDL"), "Guadalajara");
    }

    #[test]
    fn test_label_falls_back_to_raw_id() {
        let data = ReferenceData {
            sites: vec![site("GDL", "Guadalajara")],
            ..Default::default()
        };
        assert_eq!(data.site_label("MTY"), "MTY");
        assert_eq!(data.role_label("supervisor"), "supervisor");
    }
}
