use serde::{Deserialize, Serialize};

/// Taxpayer and software identification printed in the audit file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// NIF of the school.
    pub tax_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    /// Software certificate number issued by the tax authority.
    pub software_certificate: String,
    pub product_id: String,
    pub product_version: String,
    /// Recorded as `SourceID` on every document.
    pub source_id: String,
}

impl CompanyInfo {
    /// Placeholder identity for development environments.
    pub fn development() -> Self {
        Self {
            tax_id: "5000000000".to_string(),
            name: "Escola de Desenvolvimento".to_string(),
            address: "Rua Principal".to_string(),
            city: "Luanda".to_string(),
            software_certificate: "0".to_string(),
            product_id: "EduGest/EduGest".to_string(),
            product_version: "0.1.0".to_string(),
            source_id: "edugest".to_string(),
        }
    }
}
