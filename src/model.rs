//! The catalog data model: a named, coloured collection of products.
//!
//! Field names serialize in camelCase so catalogs written by the mobile app's
//! storage layer load without conversion.

use crate::colour::Colour;
use crate::ValidationError;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary colour given to catalogs that don't pick one
pub const DEFAULT_PRIMARY_COLOUR: &str = "#1089ED";

/// Most colours a palette can hold
pub const MAX_PALETTE_COLOURS: usize = 3;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One to three hex colours, the first of which is the catalog's primary colour.
///
/// Serialized as a plain JSON array. Missing trailing entries are commonly stored
/// as `null`, which is dropped when loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<String>>", into = "Vec<String>")]
pub struct Palette(Vec<String>);

impl Palette {
    pub fn new<S: Into<String>>(primary: S) -> Palette {
        Palette(vec![primary.into()])
    }

    /// Build a palette from up to three colours, skipping empty entries
    pub fn from_colours<I, S>(colours: I) -> Result<Palette, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colours: Vec<String> = colours
            .into_iter()
            .map(Into::into)
            .filter(|c| !c.trim().is_empty())
            .collect();
        if colours.is_empty() || colours.len() > MAX_PALETTE_COLOURS {
            return Err(ValidationError::PaletteSize(colours.len()));
        }
        Ok(Palette(colours))
    }

    pub fn primary(&self) -> &str {
        // construction guarantees at least one entry
        self.0.first().map(String::as_str).unwrap_or(DEFAULT_PRIMARY_COLOUR)
    }

    pub fn colours(&self) -> &[String] {
        &self.0
    }

    /// The primary colour, parsed for drawing
    pub fn primary_colour(&self) -> Option<Colour> {
        Colour::from_hex(self.primary())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(bad) = self.0.iter().find(|c| Colour::from_hex(c).is_none()) {
            return Err(ValidationError::PaletteColour(bad.clone()));
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new(DEFAULT_PRIMARY_COLOUR)
    }
}

impl TryFrom<Vec<Option<String>>> for Palette {
    type Error = ValidationError;

    fn try_from(value: Vec<Option<String>>) -> Result<Self, Self::Error> {
        Palette::from_colours(value.into_iter().flatten())
    }
}

impl From<Palette> for Vec<String> {
    fn from(value: Palette) -> Self {
        value.0
    }
}

/// A single entry of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Shown instead of `price` when set. Not checked against `price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotional_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl Product {
    /// Create a product with a fresh random id
    pub fn new<S: Into<String>>(name: S, price: f64) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            promotional_price: None,
            description: None,
            image_uri: None,
        }
    }

    pub fn with_promotional_price(mut self, price: f64) -> Product {
        self.promotional_price = Some(price);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Product {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_uri<S: Into<String>>(mut self, uri: S) -> Product {
        self.image_uri = Some(uri.into());
        self
    }

    /// The price a customer pays: the promotional price when there is one
    pub fn effective_price(&self) -> f64 {
        self.promotional_price.unwrap_or(self.price)
    }

    /// [Product::effective_price] formatted for display, without trailing zeros
    /// (`80.0` shows as `80`, `19.9` as `19.9`)
    pub fn display_price(&self) -> String {
        format!("{}", self.effective_price())
    }

    /// The description, if it has any visible text
    pub fn visible_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }

    /// The image URI, if it is not blank
    pub fn image_source(&self) -> Option<&str> {
        self.image_uri.as_deref().filter(|u| !u.trim().is_empty())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for price in std::iter::once(self.price).chain(self.promotional_price) {
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::Price {
                    id: self.id.clone(),
                    price,
                });
            }
        }
        Ok(())
    }
}

/// A named collection of products, the unit of export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    pub colors: Palette,
    /// Display and export order
    #[serde(default)]
    pub products: Vec<Product>,
    /// ISO-8601 timestamps
    pub created_at: String,
    pub updated_at: String,
}

impl Catalog {
    /// Create an empty catalog with a fresh random id, stamped with the current time
    pub fn new<S: Into<String>>(name: S, colors: Palette) -> Catalog {
        let now = now_rfc3339();
        Catalog {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            logo_uri: None,
            colors,
            products: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Mark the catalog as modified now
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    pub fn logo_source(&self) -> Option<&str> {
        self.logo_uri.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn updated_at_parsed(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.updated_at).ok()
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at.clone(),
            logo_uri: self.logo_uri.clone(),
            colors: self.colors.clone(),
            products_count: self.products.len(),
        }
    }

    /// Check the invariants an exportable catalog must hold
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let colours = self.colors.colours().len();
        if colours == 0 || colours > MAX_PALETTE_COLOURS {
            return Err(ValidationError::PaletteSize(colours));
        }
        self.colors.validate()?;
        self.products.iter().try_for_each(Product::validate)
    }
}

/// What a list of catalogs shows about each one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    pub colors: Palette,
    pub products_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = r##"{
        "id": "c1",
        "name": "Verão",
        "colors": ["#1089ED", null, null],
        "products": [
            {"id": "p1", "name": "Camiseta", "price": 100, "promotionalPrice": 80},
            {"id": "p2", "name": "Boné", "price": 50, "imageUri": "https://example.com/bone.jpg"}
        ],
        "createdAt": "2024-01-01T10:00:00.000Z",
        "updatedAt": "2024-01-02T10:00:00.000Z"
    }"##;

    #[test]
    fn loads_app_json_and_drops_null_palette_entries() {
        let catalog: Catalog = serde_json::from_str(STORED).expect("can parse catalog");
        assert_eq!(catalog.colors.colours(), &["#1089ED".to_string()]);
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].promotional_price, Some(80.0));
        assert_eq!(catalog.logo_uri, None);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn promotional_price_takes_precedence() {
        let catalog: Catalog = serde_json::from_str(STORED).expect("can parse catalog");
        assert_eq!(catalog.products[0].display_price(), "80");
        assert_eq!(catalog.products[1].display_price(), "50");
        assert_eq!(Product::new("x", 19.9).display_price(), "19.9");
    }

    #[test]
    fn promotional_price_above_price_is_still_shown() {
        let product = Product::new("x", 10.0).with_promotional_price(12.5);
        assert_eq!(product.display_price(), "12.5");
    }

    #[test]
    fn palette_rejects_too_many_colours() {
        let parsed = serde_json::from_str::<Palette>(r##"["#000", "#111", "#222", "#333"]"##);
        assert!(parsed.is_err());
        assert!(serde_json::from_str::<Palette>("[]").is_err());
        assert!(serde_json::from_str::<Palette>("[null]").is_err());
    }

    #[test]
    fn validation_catches_blank_names_and_bad_prices() {
        let mut catalog = Catalog::new("   ", Palette::default());
        assert_eq!(catalog.validate(), Err(ValidationError::EmptyName));

        catalog.name = "Loja".to_string();
        let product = Product::new("Caneca", -1.0);
        let id = product.id.clone();
        catalog.products.push(product);
        assert_eq!(
            catalog.validate(),
            Err(ValidationError::Price { id, price: -1.0 })
        );
    }

    #[test]
    fn validation_rejects_unparseable_palette_colours() {
        let catalog = Catalog::new("Loja", Palette::new("blue"));
        assert_eq!(
            catalog.validate(),
            Err(ValidationError::PaletteColour("blue".to_string()))
        );
    }

    #[test]
    fn new_catalogs_get_unique_ids_and_parseable_timestamps() {
        let a = Catalog::new("A", Palette::default());
        let b = Catalog::new("B", Palette::default());
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert!(a.updated_at_parsed().is_some());
    }

    #[test]
    fn summary_counts_products() {
        let mut catalog = Catalog::new("Loja", Palette::default());
        catalog.products.push(Product::new("a", 1.0));
        catalog.products.push(Product::new("b", 2.0));
        let summary = catalog.summary();
        assert_eq!(summary.products_count, 2);
        assert_eq!(summary.name, "Loja");
    }

    #[test]
    fn optional_fields_are_omitted_when_serialized() {
        let product = Product::new("a", 1.0);
        let json = serde_json::to_value(&product).expect("can serialize");
        assert!(json.get("promotionalPrice").is_none());
        assert!(json.get("imageUri").is_none());
    }
}
