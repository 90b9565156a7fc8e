use askstream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AskError> {
    let client = AskClient::from_env()?;

    let result = client
        .ask("What changed in the last release?")
        .stream(false)
        .collect()
        .await?;

    println!("{}", result.answer);
    Ok(())
}
