//! Search and filter helpers for the table views

use crate::models::{BeverageType, Product, Role, SalesOrder, Site, User};

/// Rows that can be matched against a free-text search box
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Lower-case and strip the accents common in Spanish product and site names
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'Á' | 'À' | 'Ä' => 'a',
            'é' | 'è' | 'ë' | 'É' | 'È' | 'Ë' => 'e',
            'í' | 'ì' | 'ï' | 'Í' | 'Ì' | 'Ï' => 'i',
            'ó' | 'ò' | 'ö' | 'Ó' | 'Ò' | 'Ö' => 'o',
            'ú' | 'ù' | 'ü' | 'Ú' | 'Ù' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn matches<T: Searchable>(item: &T, query: &str) -> bool {
    let needle = normalize(query.trim());
    needle.is_empty()
        || item
            .search_fields()
            .into_iter()
            .any(|field| normalize(field).contains(&needle))
}

/// Keep the rows matching `query`; a missing or blank query keeps everything
pub fn search<T: Searchable>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    match query {
        Some(q) if !q.trim().is_empty() => items.into_iter().filter(|i| matches(i, q)).collect(),
        _ => items,
    }
}

impl Searchable for Role {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.id.as_str(), self.name.as_str()]
    }
}

impl Searchable for Site {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.name.as_str()];
        if let Some(address) = &self.address {
            fields.push(address);
        }
        fields
    }
}

impl Searchable for BeverageType {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.id.as_str(), self.name.as_str()]
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.sku.as_str(),
            self.beverage_type_id.as_str(),
            self.site_id.as_str(),
        ]
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.name.as_str(), self.role_id.as_str()];
        if let Some(site) = &self.site_id {
            fields.push(site);
        }
        fields
    }
}

impl Searchable for SalesOrder {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.site_id.as_str(), self.status.as_str()];
        fields.extend(self.items.iter().map(|i| i.product_name.as_str()));
        if let Some(notes) = &self.notes {
            fields.push(notes);
        }
        fields
    }
}
