use slidenote_api::{Client, DEFAULT_BASE_URL, Request, SlidenoteApiError};

#[tokio::main]
pub async fn main() -> Result<(), SlidenoteApiError> {
    let client = Client::new(DEFAULT_BASE_URL, "access_token");

    let req = Request::files().list("*");

    let res = client.send(req).await?;
    for file in res.data.files {
        println!("{} {} ({} slides)", file.id, file.display_name, file.slides.len());
    }
    Ok(())
}
