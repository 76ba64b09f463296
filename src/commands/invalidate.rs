use super::CommandResult;
use crate::service::AnalysisService;
use crate::source::ElectoralSource;
use colored::Colorize;

pub async fn invalidate<S>(
    service: &AnalysisService<S>,
    slug: Option<&str>,
    all: bool,
) -> CommandResult
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let keys = match (slug, all) {
        (_, true) => service.invalidate_all().await?,
        (Some(slug), false) => service.invalidate(slug).await?,
        (None, false) => return Err("pass a slug or --all".into()),
    };

    println!(
        "🗑️  Removed {} cache entr{}",
        keys.len().to_string().bright_yellow(),
        if keys.len() == 1 { "y" } else { "ies" }
    );
    for key in keys {
        println!("  {}", key.dimmed());
    }

    Ok(())
}
