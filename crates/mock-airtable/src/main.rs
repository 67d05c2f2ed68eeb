use tokio::net::TcpListener;

use mock_airtable::MockAirtable;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "4010".to_string());
    let token = std::env::var("MOCK_TOKEN").unwrap_or_else(|_| "patMockToken".to_string());
    let base_id = std::env::var("MOCK_BASE_ID").unwrap_or_else(|_| "appWhatsubBase".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} (base {base_id}, tables tblUsers, Table 1)");
    mock_airtable::run(listener, MockAirtable::new(&token, &base_id, &["tblUsers", "Table 1"])).await
}
