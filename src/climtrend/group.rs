use std::collections::HashMap;

use crate::climtrend::config::GroupOrder;
use crate::climtrend::{LocationKey, Observation};

/// All observations of one location, in input order.
#[derive(Debug)]
pub struct Group {
    pub key: LocationKey,
    pub observations: Vec<Observation>,
}

/// Groups observations by (name, latitude, longitude). Coordinates have to
/// match exactly, no rounding takes place.
pub fn by_location(observations: Vec<Observation>, order: GroupOrder) -> Vec<Group> {
    let mut index = HashMap::<LocationKey, usize>::new();
    let mut groups = Vec::<Group>::new();

    for observation in observations {
        let key = observation.key();

        let idx = *index.entry(key).or_insert_with_key(|key| {
            groups.push(Group { key: key.clone(), observations: Vec::new() });
            groups.len() - 1
        });

        groups[idx].observations.push(observation);
    }

    if order == GroupOrder::Sorted {
        groups.sort_by(|a, b| a.key.cmp(&b.key));
    }

    groups
}
