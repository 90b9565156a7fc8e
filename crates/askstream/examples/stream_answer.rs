use askstream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AskError> {
    let client = AskClient::from_env()?;

    let mut callbacks = Callbacks::new()
        .on(EventCategory::Answer, |chunk| {
            print!("{chunk}");
            Ok(())
        })
        .on(EventCategory::Hit, |hit| {
            eprintln!("[hit] {hit}");
            Ok(())
        })
        .on_malformed(|category, payload, err| {
            eprintln!("[{category}] ignoring undecodable payload {payload:?}: {err}");
        });

    let result = client
        .ask("Summarize the retention policy.")
        .top_k(4)
        .send(&mut callbacks)
        .await?;

    println!();
    if let Some(classification) = &result.classification {
        eprintln!(
            "route={} confidence={:.2}",
            classification.route, classification.confidence
        );
    }
    for question in &result.followup_questions {
        println!("- {question}");
    }
    Ok(())
}
