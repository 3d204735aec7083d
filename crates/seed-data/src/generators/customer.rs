//! Customer generation.

use fake::{Fake, faker::name::en::Name};
use rand::Rng;
use uuid::{Builder, Uuid};

use crate::dataset::CustomerRecord;

/// Generates plausible customers with avatar paths under `/customers/`.
pub struct CustomerGenerator {
    domains: Vec<String>,
}

impl CustomerGenerator {
    pub fn new() -> Self {
        Self {
            domains: vec![
                "gmail.com".to_string(),
                "outlook.com".to_string(),
                "proton.me".to_string(),
            ],
        }
    }

    /// Generates a single customer.
    ///
    /// Ids are drawn from `rng`, so a seeded rng reproduces the same rows and
    /// re-seeding stays conflict-free.
    pub fn generate(&self, rng: &mut impl Rng) -> CustomerRecord {
        let id = random_uuid(rng);
        let name: String = Name().fake_with_rng(rng);
        let slug = slugify(&name);
        let domain = &self.domains[rng.gen_range(0..self.domains.len())];

        CustomerRecord {
            id,
            email: format!("{slug}@{domain}"),
            image_url: format!("/customers/{slug}.png"),
            name,
        }
    }

    pub fn generate_batch(&self, count: usize, rng: &mut impl Rng) -> Vec<CustomerRecord> {
        (0..count).map(|_| self.generate(rng)).collect()
    }
}

impl Default for CustomerGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn random_uuid(rng: &mut impl Rng) -> Uuid {
    Builder::from_random_bytes(rng.r#gen()).into_uuid()
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
