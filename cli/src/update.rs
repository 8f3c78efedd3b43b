use eyre::{bail, Result};
use itertools::Itertools;

use base::setting::Settings;
use common::fetch::{client, sources};

pub async fn update(settings: &Settings, render: bool) -> Result<()> {
    let client = client(&settings.http)?;
    let sources = sources(settings, client);
    if sources.is_empty() {
        bail!("Every provider is disabled, nothing to fetch");
    }

    let report = common::run(&sources, &settings.site, render).await;
    let fetched = report
        .fetched
        .iter()
        .map(|(provider, count)| format!("{}={}", provider, count))
        .join(", ");
    match report.published.as_ref() {
        Some(published) => tracing::info! {
            %fetched,
            releases = report.releases,
            dump_written = report.dump_written,
            pages = published.pages,
            skipped = published.skipped,
            failures = published.failures,
            catalogue_updated = published.catalogue_updated,
            "Update done"
        },
        None => tracing::info! {
            %fetched,
            releases = report.releases,
            dump_written = report.dump_written,
            "Fetch done"
        },
    }

    if report.failures() > 0 {
        bail!("{} output(s) could not be written", report.failures());
    }
    Ok(())
}
