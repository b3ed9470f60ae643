use anyhow::Context;
use bytes::Bytes;
use qos_probe::metrics::{install_recorder, render_metrics};
use qos_probe::{ProbeConfig, ProbeError, ProbePublisher, ProbeSubscriber};
use tokio::sync::mpsc;

/// Every 11th message is dropped, every 7th delivered twice and every 5th
/// held back behind its successor.
async fn impaired_loopback(mut rx: mpsc::Receiver<Bytes>, tx: mpsc::Sender<Bytes>) {
    let mut held: Option<Bytes> = None;
    let mut n = 0u64;

    while let Some(data) = rx.recv().await {
        n += 1;
        if n % 11 == 0 {
            continue;
        }
        if n % 5 == 0 && held.is_none() {
            held = Some(data);
            continue;
        }

        let duplicate = (n % 7 == 0).then(|| data.clone());
        for item in std::iter::once(data).chain(duplicate).chain(held.take()) {
            if tx.send(item).await.is_err() {
                return;
            }
        }
    }

    if let Some(data) = held {
        let _ = tx.send(data).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .try_init();

    install_recorder().context("installing metrics recorder")?;

    println!("QoS Probe - loopback demo");
    println!("=========================\n");

    let config = ProbeConfig {
        count: 50,
        interval_ms: 5,
        ..Default::default()
    };

    let (publish_tx, publish_rx) = mpsc::channel::<Bytes>(64);
    let (deliver_tx, mut deliver_rx) = mpsc::channel::<Bytes>(64);

    let publisher = ProbePublisher::new(config.clone())?;
    let mut subscriber = ProbeSubscriber::new(config)?;

    tokio::spawn(impaired_loopback(publish_rx, deliver_tx));

    let publishing = tokio::spawn(async move {
        publisher
            .run(move |data| {
                let tx = publish_tx.clone();
                async move {
                    tx.send(data)
                        .await
                        .map_err(|e| ProbeError::Transport(e.to_string()))
                }
            })
            .await
    });

    let incoming = futures::stream::poll_fn(move |cx| deliver_rx.poll_recv(cx));
    let summary = subscriber.drain(incoming).await;
    let published = publishing.await.context("publisher task")?;

    println!("\n✓ Published: {} messages", published.sent);
    println!("✓ {}", summary.report());
    if let Some(rate) = summary.loss_rate() {
        println!("✓ Estimated loss rate: {:.1}%", rate * 100.0);
    }

    if let Some(metrics) = render_metrics() {
        println!("\nMetrics:\n{}", metrics);
    }

    Ok(())
}
