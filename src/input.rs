//! Loading of the results file
//!
//! The file is a semicolon-separated table with a header row. It may be
//! gzip-compressed, in which case its name should end with `.gz`.

use crate::{
    dataset::{Dataset, Record},
    progress::{ProgressConfig, ProgressReport, Work},
    Result,
};
use anyhow::Context;
use async_compression::tokio::bufread::GzipDecoder;
use csv_async::AsyncReaderBuilder;
use futures::stream::StreamExt;
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncRead, BufReader},
};
use tokio_util::io::InspectReader;

/// Load the results file at some location
pub async fn load(path: &Path, report: &ProgressReport) -> Result<Dataset> {
    // Open the file and find out how much data must be read
    let context = || format!("opening results file {}", path.display());
    let file = File::open(path).await.with_context(context)?;
    let size = file.metadata().await.with_context(context)?.len();

    // Track how many raw bytes have been read so far
    let bytes = report.add("Loading results", ProgressConfig::new(Work::Bytes(size)));
    let raw = BufReader::new(InspectReader::new(file, move |block: &[u8]| {
        bytes.make_progress(block.len() as u64);
    }));

    // Apply gzip decoder to compressed files
    let text: Box<dyn AsyncRead + Send + Unpin> = if is_gzipped(path) {
        log::debug!("Decompressing {} as gzip", path.display());
        Box::new(GzipDecoder::new(raw))
    } else {
        Box::new(raw)
    };

    // Decode the records
    let dataset = read_records(text)
        .await
        .with_context(|| format!("reading results from {}", path.display()))?;
    if dataset.is_empty() {
        log::warn!("{} contains no records, all charts will be blank", path.display());
    } else {
        log::info!("Loaded {} records from {}", dataset.len(), path.display());
    }
    Ok(dataset)
}

/// Decode semicolon-separated records from a stream of bytes
///
/// The first row must be a header naming at least every column of
/// [`Record`]. A missing column or a value that is not a number is an error.
pub async fn read_records(text: impl AsyncRead + Send + Unpin) -> Result<Dataset> {
    let mut entries = AsyncReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .create_deserializer(text)
        .into_deserialize::<Record>();
    let mut records = Vec::new();
    while let Some(entry) = entries.next().await {
        let record = entry.with_context(|| format!("decoding record #{}", records.len() + 1))?;
        records.push(record);
    }
    Ok(records.into_iter().collect())
}

/// Truth that a file should be decompressed before decoding
fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::write::GzipEncoder;
    use tokio::io::AsyncWriteExt;

    const HEADER: &str = "id;query;k;simMember;simMeta;synMember;synMeta;%missing;maxDistance;ngramSize;ngrams_count;similarity;sentence_count;sentence_count_pruned;sentence_pruned;lemmatization_time;match_time;sentence_time";

    fn sample() -> String {
        format!(
            "{HEADER}\n\
             1;sales by year;1;0.9;0.4;1;5;0.6;3;3;4;0.5;120;60;30;100;200;300\n\
             1;sales by year;2;0.9;0.4;1;5;0.6;3;3;4;0.75;120;60;30;110;210;310\n"
        )
    }

    #[tokio::test]
    async fn loads_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        std::fs::write(&path, sample()).unwrap();

        let dataset = load(&path, &ProgressReport::new()).await.unwrap();
        assert_eq!(dataset.len(), 2);
        let second = dataset.records()[1];
        assert_eq!(second.k, 2.0);
        assert_eq!(second.missing, 0.6);
        assert_eq!(second.similarity, 0.75);
        assert_eq!(second.sentence_time, 310.0);
    }

    #[tokio::test]
    async fn gzipped_file_loads_the_same_records() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("test.csv");
        let gzipped = dir.path().join("test.csv.gz");
        std::fs::write(&plain, sample()).unwrap();
        let mut encoder = GzipEncoder::new(Vec::new());
        encoder.write_all(sample().as_bytes()).await.unwrap();
        encoder.shutdown().await.unwrap();
        std::fs::write(&gzipped, encoder.into_inner()).unwrap();

        let report = ProgressReport::new();
        assert_eq!(
            load(&plain, &report).await.unwrap(),
            load(&gzipped, &report).await.unwrap()
        );
    }

    #[tokio::test]
    async fn missing_column_is_fatal() {
        let text = "id;k;similarity\n1;1;0.5\n";
        let error = read_records(text.as_bytes()).await.unwrap_err();
        assert!(format!("{error:#}").contains("simMember"), "{error:#}");
    }

    #[tokio::test]
    async fn malformed_value_is_fatal() {
        let text = sample().replace(";0.75;", ";high;");
        assert!(read_records(text.as_bytes()).await.is_err());
    }

    #[tokio::test]
    async fn header_only_is_an_empty_dataset() {
        let dataset = read_records(format!("{HEADER}\n").as_bytes()).await.unwrap();
        assert!(dataset.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(load(&missing, &ProgressReport::new()).await.is_err());
    }
}
