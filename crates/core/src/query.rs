//! Route query-parameter codec and milestone inference
//!
//! Query format: repeated `report=` names, `minRev`/`maxRev` as an integer
//! or `latest`, and `m` as a milestone number.

use crate::data::Revision;
use serde::{Deserialize, Serialize};

/// Ordered `(milestone, first revision)` pairs, ascending by revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTable {
    milestones: Vec<(u32, u64)>,
}

impl MilestoneTable {
    /// Build a table; entries are sorted by boundary revision
    pub fn new(mut milestones: Vec<(u32, u64)>) -> Self {
        milestones.sort_by_key(|&(_, revision)| revision);
        Self { milestones }
    }

    /// Chromium release milestones and the revision each branched at
    pub fn chromium() -> Self {
        Self::new(vec![
            (54, 416_640),
            (55, 433_391),
            (56, 445_288),
            (57, 454_466),
            (58, 463_842),
            (59, 474_839),
            (60, 488_392),
            (61, 499_187),
            (62, 508_578),
            (63, 520_840),
            (64, 530_369),
            (65, 541_461),
            (66, 550_428),
            (67, 561_733),
            (68, 576_753),
            (69, 587_811),
            (70, 599_034),
            (71, 612_437),
            (72, 625_896),
            (73, 638_880),
        ])
    }

    /// The newest milestone
    pub fn current(&self) -> Option<u32> {
        self.milestones.last().map(|&(milestone, _)| milestone)
    }

    pub fn revision(&self, milestone: u32) -> Option<u64> {
        self.milestones
            .iter()
            .find(|&&(m, _)| m == milestone)
            .map(|&(_, revision)| revision)
    }

    /// Revision range covered by a milestone; the newest one runs to `latest`
    pub fn range(&self, milestone: u32) -> Option<(Revision, Revision)> {
        let index = self.milestones.iter().position(|&(m, _)| m == milestone)?;
        let min = Revision::Number(self.milestones[index].1);
        let max = self
            .milestones
            .get(index + 1)
            .map(|&(_, revision)| Revision::Number(revision))
            .unwrap_or(Revision::Latest);
        Some((min, max))
    }

    /// First milestone whose boundary lies inside `[min, max]`
    pub fn infer(&self, min: u64, max: Revision) -> Option<u32> {
        self.milestones
            .iter()
            .find(|&&(_, boundary)| {
                boundary >= min
                    && match max {
                        Revision::Latest => true,
                        Revision::Number(max) => max >= boundary,
                    }
            })
            .map(|&(milestone, _)| milestone)
    }
}

/// Section options decoded from route query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    pub sources: Vec<String>,
    pub milestone: Option<u32>,
    pub min_revision: Option<Revision>,
    pub max_revision: Option<Revision>,
}

impl RouteOptions {
    /// Decode `report`, `m`, `minRev` and `maxRev`.
    ///
    /// Unparseable or zero values are treated as absent. Integer revisions
    /// given in descending order are swapped. Without an explicit milestone,
    /// one is inferred from integer revisions.
    pub fn from_query(query: &str, milestones: &MilestoneTable) -> Self {
        let query = query.trim_start_matches('?');
        let mut options = RouteOptions::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "report" => options.sources.push(value.into_owned()),
                "m" => options.milestone = value.parse().ok().filter(|&m| m != 0),
                "minRev" => options.min_revision = parse_revision(&value),
                "maxRev" => options.max_revision = parse_revision(&value),
                _ => {}
            }
        }

        if let (Some(Revision::Number(min)), Some(Revision::Number(max))) =
            (options.min_revision, options.max_revision)
        {
            if max < min {
                options.min_revision = Some(Revision::Number(max));
                options.max_revision = Some(Revision::Number(min));
            }
        }

        if options.milestone.is_none() {
            if let (Some(Revision::Number(min)), Some(max)) =
                (options.min_revision, options.max_revision)
            {
                options.milestone = milestones.infer(min, max);
            }
        }

        options
    }
}

fn parse_revision(value: &str) -> Option<Revision> {
    value
        .parse()
        .ok()
        .filter(|revision| *revision != Revision::Number(0))
}

/// Encode route parameters for a section
pub fn encode_route(sources: &[&str], min: Option<Revision>, max: Option<Revision>) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    for source in sources {
        params.append_pair("report", source);
    }
    if let Some(min) = min {
        params.append_pair("minRev", &min.to_string());
    }
    if let Some(max) = max {
        params.append_pair("maxRev", &max.to_string());
    }
    params.finish()
}
