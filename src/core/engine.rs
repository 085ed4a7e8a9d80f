use crate::core::normalizer::QUOTE_KEY;
use crate::core::Pipeline;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

pub struct QuoteEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> QuoteEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs one quotation end to end and returns the local PDF path.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<String> {
        tracing::info!("Starting quotation run");

        let mut replacements = self.pipeline.prepare(now).await?;
        tracing::debug!("Prepared {} replacements", replacements.len());

        let quote = self.pipeline.record(&replacements, now).await?;
        tracing::info!("🧾 Allocated quotation {}", quote);
        replacements.insert(QUOTE_KEY, quote.to_string());

        let rendered = self.pipeline.render(&replacements).await?;
        tracing::info!(
            "📄 Rendered {} ({} bytes)",
            rendered.file_name,
            rendered.content.len()
        );

        let output_path = self.pipeline.store(rendered).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(output_path)
    }
}
