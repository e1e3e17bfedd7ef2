use datafusion::arrow::util::pretty::print_batches;
use datafusion::execution::context::SessionContext;
use opendic_datafusion::config::OpenDicConfig;
use opendic_datafusion::{OpenDicContextExt as _, OpenDicResponse, SqlOutcome};

static CATALOG_URI: &str = "http://localhost:8181/api/opendic/v1";

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = OpenDicConfig::session_config()
        .set_str("opendic.catalog.uri", CATALOG_URI)
        .set_str("opendic.sync.default_platform", "datafusion");
    let ctx = SessionContext::new_with_config(config);

    for sql in [
        r#"DEFINE OPEN function PROPS {"language": "string", "definition": "string"}"#,
        r#"CREATE OPEN function add_one PROPS {"language": "sql", "definition": "x + 1"}"#,
        "SHOW OPEN function",
        "SYNC OPEN function",
        "SELECT 1 AS one",
    ] {
        println!("> {sql}");
        match ctx.sql_open(sql).await {
            Ok(SqlOutcome::Native(batches)) => print_batches(&batches)?,
            Ok(SqlOutcome::Catalog(response)) => {
                print_batches(&[response.to_record_batch()?])?;
                if let Some(report) = response.executions() {
                    print_batches(&[report.to_record_batch()?])?;
                }
            }
            Err(e) => println!("{}", OpenDicResponse::from(&e)),
        }
    }

    Ok(())
}
