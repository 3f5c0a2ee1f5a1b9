//! Typed contractor rows

use serde::{Deserialize, Serialize};

use super::service::{is_available, OWNER_FIELD};
use crate::errors::{DbError, DbResult};
use crate::schema::SchemaCatalog;
use crate::storage::RecordNumber;

/// One contractor as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contractor {
    pub record_number: RecordNumber,
    pub name: String,
    pub location: String,
    pub specialties: String,
    /// Staff count; 0 when the stored text is not a number
    pub size: u32,
    /// Hourly charge exactly as stored, currency symbol included
    pub rate: String,
    /// Customer holding the booking; 0 when blank or not a number
    pub owner: u64,
    /// Whether `book` would accept this contractor
    pub available: bool,
}

impl Contractor {
    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// Column positions of the contractor fields within a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractorColumns {
    pub name: usize,
    pub location: usize,
    pub specialties: usize,
    pub size: usize,
    pub rate: usize,
    pub owner: usize,
}

impl ContractorColumns {
    /// Finds every contractor column by name.
    ///
    /// # Errors
    ///
    /// `InvalidHeader` naming the first column the schema lacks.
    pub fn discover(catalog: &SchemaCatalog) -> DbResult<Self> {
        let column = |name: &str| {
            catalog
                .field_index(name)
                .ok_or_else(|| DbError::InvalidHeader(format!("missing column '{}'", name)))
        };

        Ok(Self {
            name: column("name")?,
            location: column("location")?,
            specialties: column("specialties")?,
            size: column("size")?,
            rate: column("rate")?,
            owner: column(OWNER_FIELD)?,
        })
    }

    /// Search criteria matching `name` and `location` by prefix.
    pub fn criteria<'a>(&self, field_count: usize, name: Option<&'a str>, location: Option<&'a str>) -> Vec<Option<&'a str>> {
        let mut criteria = vec![None; field_count];
        criteria[self.name] = name;
        criteria[self.location] = location;
        criteria
    }

    /// Builds a contractor from a raw row of this schema.
    pub fn to_contractor(&self, record_number: RecordNumber, values: &[String]) -> Contractor {
        let text = |index: usize| values[index].trim().to_string();

        Contractor {
            record_number,
            name: text(self.name),
            location: text(self.location),
            specialties: text(self.specialties),
            size: values[self.size].trim().parse().unwrap_or(0),
            rate: text(self.rate),
            owner: values[self.owner].trim().parse().unwrap_or(0),
            available: is_available(&values[self.owner]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new(vec![
            FieldDescriptor::new("name", 32),
            FieldDescriptor::new("location", 64),
            FieldDescriptor::new("specialties", 64),
            FieldDescriptor::new("size", 6),
            FieldDescriptor::new("rate", 8),
            FieldDescriptor::new("owner", 8),
        ])
    }

    #[test]
    fn test_discover_columns() {
        let columns = ContractorColumns::discover(&catalog()).unwrap();
        assert_eq!(columns.name, 0);
        assert_eq!(columns.rate, 4);
        assert_eq!(columns.owner, 5);
    }

    #[test]
    fn test_missing_column() {
        let catalog = SchemaCatalog::new(vec![FieldDescriptor::new("name", 8), FieldDescriptor::new("location", 8)]);
        let err = ContractorColumns::discover(&catalog).unwrap_err();
        assert!(matches!(err, DbError::InvalidHeader(ref m) if m.contains("specialties")));
    }

    #[test]
    fn test_row_parsing() {
        let columns = ContractorColumns::discover(&catalog()).unwrap();
        let row: Vec<String> = ["Dogs With Tools", "Smallville", "Roofing", " 7x", "$35.00", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let contractor = columns.to_contractor(3, &row);
        assert_eq!(contractor.record_number, 3);
        assert_eq!(contractor.size, 0);
        assert_eq!(contractor.rate, "$35.00");
        assert!(contractor.is_available());
    }

    #[test]
    fn test_criteria_layout() {
        let columns = ContractorColumns::discover(&catalog()).unwrap();
        let criteria = columns.criteria(6, Some("Dogs"), None);
        assert_eq!(criteria, vec![Some("Dogs"), None, None, None, None, None]);
    }

    #[test]
    fn test_unparseable_owner_is_booked() {
        let columns = ContractorColumns::discover(&catalog()).unwrap();
        let row: Vec<String> = ["Dogs With Tools", "Smallville", "Roofing", "7", "$35.00", "abc"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let contractor = columns.to_contractor(0, &row);
        assert_eq!(contractor.owner, 0);
        assert!(!contractor.is_available());
    }
}
