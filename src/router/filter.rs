use std::sync::Arc;

use crate::model::TripMeta;

/// "Polymorphic trip filter" capability (spec.md §9): a single predicate
/// tested against a trip's metadata before it is boarded, whether at round-0
/// seeding or via a precomputed transfer.
pub trait TripFilter: Send + Sync {
    fn accept(&self, trip: &TripMeta) -> bool;
}

/// Boards every trip. The default when a caller has no restriction.
pub struct AcceptAll;

impl TripFilter for AcceptAll {
    fn accept(&self, _trip: &TripMeta) -> bool {
        true
    }
}

/// Boards only trips whose GTFS `route_type` is in the allow-list.
pub struct ByRouteType(pub Vec<i32>);

impl TripFilter for ByRouteType {
    fn accept(&self, trip: &TripMeta) -> bool {
        self.0.contains(&trip.route_type)
    }
}

/// Boards only trips operated by an agency in the allow-list.
pub struct ByAgencyAllowList(pub Vec<Arc<str>>);

impl TripFilter for ByAgencyAllowList {
    fn accept(&self, trip: &TripMeta) -> bool {
        self.0.iter().any(|agency| agency.as_ref() == trip.agency_id)
    }
}

impl<F> TripFilter for F
where
    F: Fn(&TripMeta) -> bool + Send + Sync,
{
    fn accept(&self, trip: &TripMeta) -> bool {
        self(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta<'a>(descriptor: &'a crate::model::TripDescriptor, route_type: i32, agency: &'a str) -> TripMeta<'a> {
        TripMeta {
            descriptor,
            route_type,
            agency_id: agency,
            block_id: None,
        }
    }

    #[test]
    fn accept_all_always_true() {
        let descriptor = crate::model::TripDescriptor {
            feed: crate::model::FeedId::new("f"),
            trip_id: "t".into(),
            start_time: None,
            route_id: "r".into(),
        };
        assert!(AcceptAll.accept(&meta(&descriptor, 3, "AG")));
    }

    #[test]
    fn by_route_type_filters() {
        let descriptor = crate::model::TripDescriptor {
            feed: crate::model::FeedId::new("f"),
            trip_id: "t".into(),
            start_time: None,
            route_id: "r".into(),
        };
        let filter = ByRouteType(vec![2]);
        assert!(!filter.accept(&meta(&descriptor, 3, "AG")));
        assert!(filter.accept(&meta(&descriptor, 2, "AG")));
    }

    #[test]
    fn closures_implement_trip_filter() {
        let descriptor = crate::model::TripDescriptor {
            feed: crate::model::FeedId::new("f"),
            trip_id: "t".into(),
            start_time: None,
            route_id: "r".into(),
        };
        let filter = |trip: &TripMeta| trip.agency_id == "AG";
        assert!(filter.accept(&meta(&descriptor, 3, "AG")));
        assert!(!filter.accept(&meta(&descriptor, 3, "OTHER")));
    }
}
