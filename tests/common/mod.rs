//! Mock folding service shared by the integration suites.

#![allow(dead_code)]

use axum::Router;

/// Serve `router` on an ephemeral local port from a background thread and
/// return the folding endpoint URL.
pub fn serve(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind mock server");
    listener
        .set_nonblocking(true)
        .expect("Failed to configure mock server");
    let addr = listener.local_addr().expect("Mock server has no address");

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to start mock server runtime");
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("Failed to adopt listener");
            axum::serve(listener, router).await.expect("Mock server failed");
        });
    });

    format!("http://{addr}/fold")
}

/// A minimal predicted structure with one alpha carbon per residue
pub fn pdb_for(sequence: &str, confidence: f64) -> String {
    let mut text = String::from("HEADER    MOCK PREDICTION\n");
    for i in 1..=sequence.len() {
        text.push_str(&format!(
            "ATOM  {i:>5}  CA  ALA A{i:>4}      -8.608   3.135  -1.618  1.00{confidence:>6.2}           C\n"
        ));
    }
    text.push_str("END\n");
    text
}
