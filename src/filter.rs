use crate::feed::types::VehiclePosition;

/// Inclusive coordinate range. A missing upper bound leaves the range open
/// above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl CoordRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

/// Latitude and longitude ranges apply independently of each other; each is
/// switched on by its lower bound alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub latitude: Option<CoordRange>,
    pub longitude: Option<CoordRange>,
}

impl BoundingBox {
    pub fn from_bounds(
        lat_min: Option<f64>,
        lat_max: Option<f64>,
        lon_min: Option<f64>,
        lon_max: Option<f64>,
    ) -> Self {
        Self {
            latitude: lat_min.map(|min| CoordRange { min, max: lat_max }),
            longitude: lon_min.map(|min| CoordRange { min, max: lon_max }),
        }
    }

    pub fn contains(&self, vehicle: &VehiclePosition) -> bool {
        self.latitude.map_or(true, |r| r.contains(vehicle.latitude))
            && self.longitude.map_or(true, |r| r.contains(vehicle.longitude))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    /// Empty means every line.
    pub lines: Vec<String>,
    pub bbox: BoundingBox,
    /// Keep only reports strictly newer than this epoch-millis value.
    pub since: Option<i64>,
}

impl VehicleFilter {
    /// `line` may hold several comma-separated identifiers.
    pub fn new(line: Option<&str>, bbox: BoundingBox) -> Self {
        let lines = line
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            lines,
            bbox,
            since: None,
        }
    }

    /// Non-positive values leave the filter off.
    pub fn with_since(mut self, since: Option<i64>) -> Self {
        self.since = since.filter(|s| *s > 0);
        self
    }

    pub fn matches(&self, vehicle: &VehiclePosition) -> bool {
        self.matches_line(vehicle)
            && self.bbox.contains(vehicle)
            && self.since.map_or(true, |since| vehicle.timestamp > since)
    }

    fn matches_line(&self, vehicle: &VehiclePosition) -> bool {
        if self.lines.is_empty() {
            return true;
        }
        match vehicle.line.as_deref() {
            Some(line) => self.lines.iter().any(|wanted| wanted.eq_ignore_ascii_case(line)),
            None => false,
        }
    }

    pub fn apply(&self, vehicles: &[VehiclePosition]) -> Vec<VehiclePosition> {
        vehicles.iter().filter(|v| self.matches(v)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(line: Option<&str>, latitude: f64, longitude: f64) -> VehiclePosition {
        VehiclePosition {
            id: None,
            line: line.map(str::to_string),
            latitude,
            longitude,
            timestamp: 0,
        }
    }

    fn sample() -> Vec<VehiclePosition> {
        vec![
            vehicle(Some("100"), -22.9, -43.2),
            vehicle(Some("200"), -23.0, -43.5),
        ]
    }

    #[test]
    fn test_no_filter_keeps_everything_in_order() {
        let vehicles = sample();
        assert_eq!(VehicleFilter::default().apply(&vehicles), vehicles);
    }

    #[test]
    fn test_line_filter() {
        let vehicles = sample();
        let filter = VehicleFilter::new(Some("100"), BoundingBox::default());
        assert_eq!(filter.apply(&vehicles), vec![vehicles[0].clone()]);
    }

    #[test]
    fn test_line_filter_ignores_case() {
        let vehicles = vec![vehicle(Some("linha100"), 0.0, 0.0)];
        let filter = VehicleFilter::new(Some("LINHA100"), BoundingBox::default());
        assert_eq!(filter.apply(&vehicles).len(), 1);
    }

    #[test]
    fn test_line_filter_skips_vehicles_without_line() {
        let vehicles = vec![vehicle(None, 0.0, 0.0)];
        let filter = VehicleFilter::new(Some("100"), BoundingBox::default());
        assert!(filter.apply(&vehicles).is_empty());
    }

    #[test]
    fn test_comma_separated_lines() {
        let mut vehicles = sample();
        vehicles.push(vehicle(Some("300"), -22.0, -43.0));

        let filter = VehicleFilter::new(Some("300, 100,"), BoundingBox::default());
        let kept = filter.apply(&vehicles);
        assert_eq!(kept, vec![vehicles[0].clone(), vehicles[2].clone()]);

        let blank = VehicleFilter::new(Some(" , "), BoundingBox::default());
        assert_eq!(blank.apply(&vehicles).len(), 3);
    }

    #[test]
    fn test_line_parameter_is_a_list_not_a_literal() {
        let vehicles = vec![
            vehicle(Some("100,200"), 0.0, 0.0),
            vehicle(Some(""), 0.0, 0.0),
            vehicle(Some("100"), 0.0, 0.0),
        ];

        // a line id containing a comma cannot be selected whole
        let comma = VehicleFilter::new(Some("100,200"), BoundingBox::default());
        assert_eq!(comma.apply(&vehicles), vec![vehicles[2].clone()]);

        // an empty parameter is no filter, not "blank lines only"
        let empty = VehicleFilter::new(Some(""), BoundingBox::default());
        assert!(empty.lines.is_empty());
        assert_eq!(empty.apply(&vehicles).len(), 3);
    }

    #[test]
    fn test_bounding_box() {
        let vehicles = sample();
        let bbox = BoundingBox::from_bounds(Some(-22.95), Some(-22.0), Some(-43.3), Some(-43.0));
        let filter = VehicleFilter::new(None, bbox);
        assert_eq!(filter.apply(&vehicles), vec![vehicles[0].clone()]);
    }

    #[test]
    fn test_bounding_box_is_inclusive() {
        let vehicles = sample();
        let bbox = BoundingBox::from_bounds(Some(-23.0), Some(-22.9), Some(-43.5), Some(-43.2));
        assert_eq!(VehicleFilter::new(None, bbox).apply(&vehicles).len(), 2);
    }

    #[test]
    fn test_latitude_and_longitude_ranges_are_independent() {
        let vehicles = sample();

        let lat_only = BoundingBox::from_bounds(Some(-22.95), Some(-22.0), None, None);
        assert_eq!(VehicleFilter::new(None, lat_only).apply(&vehicles), vec![vehicles[0].clone()]);

        let lon_only = BoundingBox::from_bounds(None, None, Some(-43.6), Some(-43.4));
        assert_eq!(VehicleFilter::new(None, lon_only).apply(&vehicles), vec![vehicles[1].clone()]);

        // an upper bound without its lower bound does nothing
        let max_only = BoundingBox::from_bounds(None, Some(-30.0), None, Some(-50.0));
        assert_eq!(VehicleFilter::new(None, max_only).apply(&vehicles).len(), 2);
    }

    #[test]
    fn test_open_upper_bound() {
        let vehicles = sample();
        let bbox = BoundingBox::from_bounds(Some(-22.95), None, None, None);
        assert_eq!(VehicleFilter::new(None, bbox).apply(&vehicles), vec![vehicles[0].clone()]);
    }

    #[test]
    fn test_since_keeps_newer_reports() {
        let mut vehicles = sample();
        vehicles[0].timestamp = 1_700_000_000_000;
        vehicles[1].timestamp = 1_700_000_060_000;

        let filter = VehicleFilter::default().with_since(Some(1_700_000_000_000));
        assert_eq!(filter.apply(&vehicles), vec![vehicles[1].clone()]);

        let off = VehicleFilter::default().with_since(Some(0));
        assert_eq!(off.since, None);
        assert_eq!(off.apply(&vehicles).len(), 2);
    }

    #[test]
    fn test_since_drops_undated_reports() {
        let vehicles = sample();
        let filter = VehicleFilter::default().with_since(Some(1));
        assert!(filter.apply(&vehicles).is_empty());
    }

    #[test]
    fn test_filters_compose() {
        let vehicles = sample();
        let bbox = BoundingBox::from_bounds(Some(-22.95), Some(-22.0), None, None);
        assert!(VehicleFilter::new(Some("200"), bbox).apply(&vehicles).is_empty());
    }
}
