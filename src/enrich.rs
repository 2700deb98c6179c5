use crate::config::PROGRESS_INTERVAL;
use crate::index::RankIndex;
use crate::normalize::eligible_domain;
use crate::parser::TopicReader;
use crate::source::Source;
use crate::stats::PipelineStats;
use anyhow::Result;
use indicatif::ProgressBar;
use std::io::BufRead;
use tracing::{info, trace};

/// Folds every eligible topic page into the ranked record for its domain.
///
/// Pages whose domain is not ranked are dropped, so the index never grows
/// past the ranking source. Returns the number of pages merged.
pub fn enrich<R: BufRead>(
    topics: Source<R>,
    index: &mut RankIndex,
    stats: &PipelineStats,
) -> Result<u64> {
    let Source { name, reader } = topics;
    let mut pages = TopicReader::new(reader, name.as_str());
    let pb = ProgressBar::new_spinner();
    let mut matched = 0u64;

    info!("Loading topic data from: {}", name);

    for page in pages.by_ref() {
        let page = page?;
        stats.inc_pages();
        if stats.pages() % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }

        let Some(domain) = eligible_domain(&page.url) else {
            trace!(url = %page.url, "Skipping ineligible page");
            stats.inc_ineligible();
            continue;
        };

        if index.merge(&domain, page) {
            matched += 1;
            stats.inc_matches();
        } else {
            stats.inc_unranked();
        }
    }

    pb.finish_and_clear();
    stats.add_malformed(pages.malformed());

    info!(
        matched,
        malformed = pages.malformed(),
        pages = stats.pages(),
        "Matched topic pages to ranked domains"
    );

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(xml: &str, index: &mut RankIndex) -> (u64, PipelineStats) {
        let stats = PipelineStats::new();
        let matched = enrich(Source::new("topics", xml.as_bytes()), index, &stats).unwrap();
        (matched, stats)
    }

    fn page(url: &str, topic: &str) -> String {
        format!(
            r#"<ExternalPage about="{}"><d:Title>{}</d:Title><topic>{}</topic></ExternalPage>"#,
            url, topic, topic
        )
    }

    #[test]
    fn eligible_page_merged() {
        let mut index = RankIndex::from_ranks([("example.com", 100), ("other.org", 50)]);
        let xml = format!("<RDF>{}</RDF>", page("http://example.com/", "Top/Tech"));
        let (matched, stats) = run(&xml, &mut index);

        assert_eq!(matched, 1);
        assert_eq!(stats.matches(), 1);
        assert_eq!(index.merges(), 1);
        let record = index.get("example.com").unwrap();
        assert_eq!(record.topics, vec!["Top/Tech"]);
        assert_eq!(record.url.as_deref(), Some("http://example.com/"));
        assert!(index.get("other.org").unwrap().topics.is_empty());
    }

    #[test]
    fn ineligible_pages_never_mutate_index() {
        let mut index = RankIndex::from_ranks([("example.com", 100)]);
        let xml = format!(
            "<RDF>{}{}{}{}</RDF>",
            page("http://example.com/?q=1", "Top/Query"),
            page("http://example.com/about", "Top/Path"),
            page("http://blog.example.com/", "Top/Sub"),
            page("http://example.com/#frag", "Top/Frag"),
        );
        let (matched, stats) = run(&xml, &mut index);

        assert_eq!(matched, 0);
        assert_eq!(stats.ineligible(), 4);
        let record = index.get("example.com").unwrap();
        assert!(record.topics.is_empty());
        assert_eq!(record.url, None);
        assert_eq!(record.title, None);
    }

    #[test]
    fn unranked_domains_are_not_added() {
        let mut index = RankIndex::from_ranks([("example.com", 100)]);
        let xml = format!("<RDF>{}</RDF>", page("http://unranked.net/", "Top/Other"));
        let (matched, stats) = run(&xml, &mut index);

        assert_eq!(matched, 0);
        assert_eq!(stats.unranked(), 1);
        assert_eq!(index.len(), 1);
        assert!(index.get("unranked.net").is_none());
    }

    #[test]
    fn www_and_bare_pages_merge_into_same_domain() {
        let mut index = RankIndex::from_ranks([("example.co.uk", 3)]);
        let xml = format!(
            "<RDF>{}{}</RDF>",
            page("http://www.example.co.uk/", "Top/First"),
            page("http://example.co.uk/", "Top/Second"),
        );
        let (matched, _) = run(&xml, &mut index);

        assert_eq!(matched, 2);
        let record = index.get("example.co.uk").unwrap();
        assert_eq!(record.topics, vec!["Top/First", "Top/Second"]);
        assert_eq!(record.url.as_deref(), Some("http://www.example.co.uk/"));
        assert_eq!(record.title.as_deref(), Some("Top/First"));
    }

    #[test]
    fn malformed_pages_counted_and_skipped() {
        let mut index = RankIndex::from_ranks([("example.com", 100)]);
        let xml = format!(
            "<RDF><ExternalPage><topic>Top/NoUrl</topic></ExternalPage>{}</RDF>",
            page("http://example.com/", "Top/Ok")
        );
        let (matched, stats) = run(&xml, &mut index);

        assert_eq!(matched, 1);
        assert_eq!(stats.malformed(), 1);
        assert_eq!(stats.pages(), 1);
    }

    #[test]
    fn unparseable_url_is_skipped() {
        let mut index = RankIndex::from_ranks([("example.com", 100)]);
        let xml = format!("<RDF>{}</RDF>", page("example.com/", "Top/Bad"));
        let (matched, stats) = run(&xml, &mut index);

        assert_eq!(matched, 0);
        assert_eq!(stats.ineligible(), 1);
    }

    #[test]
    fn syntax_error_propagates() {
        let mut index = RankIndex::from_ranks([("example.com", 100)]);
        let stats = PipelineStats::new();
        let xml = "<RDF><ExternalPage about=\"http://example.com/\"></Oops></RDF>";
        let result = enrich(Source::new("topics", xml.as_bytes()), &mut index, &stats);
        assert!(result.is_err());
    }
}
