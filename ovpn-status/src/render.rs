//! Writing snapshots back out in the status file format.

use std::fmt::Write;

use crate::snapshot::StatusSnapshot;

/// Render a snapshot as a version 1 status file.
///
/// Snapshots do not keep per-row timestamps, so `row_timestamp` is written
/// into every `Connected Since` and `Last Ref` column. It must be a
/// ctime-style timestamp such as `Mon Jan  2 15:04:05 2006` for the output to
/// parse again.
pub fn render_status_text(snapshot: &StatusSnapshot, row_timestamp: &str) -> String {
    let mut out = String::new();

    // Writing into a String never fails.
    let _ = writeln!(out, "OpenVPN CLIENT LIST");
    let _ = writeln!(out, "Updated,{}", snapshot.updated_at);
    let _ = writeln!(
        out,
        "Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since"
    );
    for client in &snapshot.clients {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            client.name,
            join_host_port(&client.real_address, &client.real_port),
            client.bytes_received,
            client.bytes_sent,
            row_timestamp
        );
    }

    let _ = writeln!(out, "ROUTING TABLE");
    let _ = writeln!(out, "Virtual Address,Common Name,Real Address,Last Ref");
    for route in &snapshot.routes {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            route.local_virtual_ip,
            route.client,
            join_host_port(&route.real_address, &route.real_port),
            row_timestamp
        );
    }

    let _ = writeln!(out, "GLOBAL STATS");
    let _ = writeln!(out, "Max bcast/mcast queue length,{}", snapshot.max_queue_length);
    let _ = writeln!(out, "END");

    out
}

fn join_host_port(host: &str, port: &str) -> String {
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    if port.is_empty() {
        host
    } else {
        format!("{host}:{port}")
    }
}
