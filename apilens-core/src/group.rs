use crate::record::ValidLog;
use std::collections::HashMap;

/// Valid logs partitioned by endpoint.
///
/// Groups iterate in first-occurrence order and keep input order inside
/// each group.
#[derive(Debug, Default)]
pub struct EndpointGroups<'r, 'a> {
    groups: Vec<(&'r str, Vec<&'r ValidLog<'a>>)>,
    index: HashMap<&'r str, usize>,
}

impl<'r, 'a> EndpointGroups<'r, 'a> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, endpoint: &str) -> Option<&[&'r ValidLog<'a>]> {
        self.index
            .get(endpoint)
            .map(|&i| self.groups[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'r str, &[&'r ValidLog<'a>])> + '_ {
        self.groups.iter().map(|(endpoint, logs)| (*endpoint, logs.as_slice()))
    }
}

/// Partition pre-validated logs by endpoint. No filtering happens here.
pub fn group_by_endpoint<'r, 'a>(logs: &'r [ValidLog<'a>]) -> EndpointGroups<'r, 'a> {
    let mut grouped = EndpointGroups::default();
    for log in logs {
        let endpoint: &'r str = &log.endpoint;
        let slot = *grouped.index.entry(endpoint).or_insert_with(|| {
            grouped.groups.push((endpoint, Vec::new()));
            grouped.groups.len() - 1
        });
        grouped.groups[slot].1.push(log);
    }
    grouped
}
