//! Tier layers: attribute rows with polygon geometry.

use geo::BoundingRect;
use geo_types::Geometry;
use wkt::ToWkt;

/// Longest field name a `.dbf` header can hold
const DBF_FIELD_NAME_LEN: usize = 10;

/// `name` cut to what a `.dbf` header keeps, on a char boundary
pub fn dbf_field_name(name: &str) -> &str {
    if name.len() <= DBF_FIELD_NAME_LEN {
        return name;
    }
    let mut end = DBF_FIELD_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// One area of a tier: attribute values in column order plus its shape
#[derive(Debug, Clone, PartialEq)]
pub struct TierFeature {
    pub attributes: Vec<Option<String>>,
    pub geometry: Option<Geometry<f64>>,
}

impl TierFeature {
    pub fn new(attributes: Vec<Option<String>>, geometry: Option<Geometry<f64>>) -> Self {
        Self {
            attributes,
            geometry,
        }
    }

    /// Geometry as well-known text, if any
    pub fn geometry_wkt(&self) -> Option<String> {
        self.geometry.as_ref().map(|g| g.wkt_string())
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .as_ref()?
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// All areas of one tier, sharing a column list
#[derive(Debug, Clone, PartialEq)]
pub struct TierLayer {
    pub tier: u8,
    pub columns: Vec<String>,
    pub features: Vec<TierFeature>,
}

impl TierLayer {
    pub fn new(tier: u8, columns: Vec<String>) -> Self {
        Self {
            tier,
            columns,
            features: Vec::new(),
        }
    }

    /// Store table holding this tier
    pub fn table_name(&self) -> String {
        format!("Tier{}_Areas", self.tier)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`column_index`](Self::column_index), falling back to the
    /// dBASE-truncated form of `name`
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        self.column_index(name)
            .or_else(|| self.column_index(dbf_field_name(name)))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Rows as stored: attributes as text followed by WKT geometry
    pub fn stored_rows(&self) -> impl Iterator<Item = Vec<Option<String>>> + '_ {
        let width = self.columns.len();
        self.features.iter().map(move |f| {
            let mut row: Vec<Option<String>> = f.attributes.clone();
            row.resize(width, None);
            row.push(f.geometry_wkt());
            row
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn test_stored_rows_append_wkt() {
        let mut layer = TierLayer::new(2, vec!["id".into(), "name".into()]);
        layer.features.push(TierFeature::new(
            vec![Some("2-001".into())],
            Some(Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ])),
        ));
        layer.features.push(TierFeature::new(vec![None, Some("b".into())], None));

        let rows: Vec<_> = layer.stored_rows().collect();
        assert_eq!(layer.table_name(), "Tier2_Areas");
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][1], None);
        assert!(rows[0][2].as_deref().unwrap().starts_with("POLYGON"));
        assert_eq!(rows[1], vec![None, Some("b".to_string()), None]);
    }

    #[test]
    fn test_resolve_truncated_column() {
        let layer = TierLayer::new(1, vec!["Service_Ar".into(), "Name".into()]);
        assert_eq!(layer.resolve_column("Service_Ar"), Some(0));
        assert_eq!(layer.resolve_column("Service_Area_Zone_de_service"), Some(0));
        assert_eq!(layer.resolve_column("Name"), Some(1));
        assert_eq!(layer.resolve_column("Missing_Column"), None);
    }

    #[test]
    fn test_dbf_field_name() {
        assert_eq!(dbf_field_name("SA_ID"), "SA_ID");
        assert_eq!(dbf_field_name("Service_Area_Zone_de_service"), "Service_Ar");
        assert_eq!(dbf_field_name("Zone_de_séjour"), "Zone_de_s");
    }
}
