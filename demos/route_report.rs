//! Analyse a single synthetic driving session.
//!
//! Run with: cargo run --example route_report

use drive_analytics::{analyze_route, AudioNote, GpsSample, MotionConfig, ReportConfig, ReviewMarker, Session, RawTags};

fn main() {
    // A short town drive: steady 12-14 m/s with one hard stop at 00:40
    let speeds = [12.0, 13.0, 14.0, 13.5, 4.0, 0.5, 6.0, 11.0, 12.5, 13.0];
    let mut session = Session::new("demo-route");
    session.device_id = Some("pixel-7".into());
    session.start_time = Some("2024-05-01T10:00:00Z".into());
    session.end_time = Some("2024-05-01T10:01:30Z".into());
    session.total_duration_min = Some(1.5);
    session.total_distance_km = Some(0.9);
    session.gps_points = speeds
        .iter()
        .enumerate()
        .map(|(i, speed)| {
            GpsSample::new(
                48.1372 + i as f64 * 0.0009,
                11.5755,
                &format!("2024-05-01T10:00:{:02}Z", i * 10),
                Some(*speed),
            )
        })
        .collect();

    session.review_markers.push(ReviewMarker {
        latitude: Some(48.1408),
        longitude: Some(11.5755),
        timestamp: Some("2024-05-01T10:00:40Z".into()),
        label: Some("Pedestrian crossing".into()),
        kind: Some("hazard".into()),
        ..Default::default()
    });
    session.audio_notes.push(AudioNote {
        latitude: Some(48.1426),
        longitude: Some(11.5755),
        timestamp: Some("2024-05-01T10:01:00Z".into()),
        tags: Some(RawTags::Text("braking, crossing".into())),
        transcript: Some("Braked late for the crossing".into()),
        ..Default::default()
    });

    let report = match analyze_route(&session, &MotionConfig::default(), &ReportConfig::default()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("analysis failed: {e}");
            return;
        }
    };

    println!("Route {}\n", report.route_id);
    println!("Stability: {:.1}/{} ({} harsh events)", report.stability.score, report.stability.out_of, report.stability.harsh_events);
    for highlight in &report.stability.highlights {
        println!("   [{}] {}", highlight.kind, highlight.note);
    }

    println!("\nSpeed: avg {:.1} km/h, max {:.1} km/h", report.speed_profile.average_kmh, report.speed_profile.max_kmh);
    println!("   {}", report.speed_profile.commentary);

    println!("\nContext mix:");
    for share in &report.context_mix {
        println!("   {:<8} {:>5.1}%  ({:.2} km)", share.label, share.share * 100.0, share.distance_km);
    }

    println!("\nTags:");
    for tag in &report.voice_tags {
        println!("   {} x{}", tag.label, tag.count);
    }

    println!("\nNotable events:");
    for event in &report.notable_events {
        println!(
            "   {} {} - {}",
            event.timestamp.as_deref().unwrap_or("?"),
            event.label.as_deref().unwrap_or(&event.kind),
            event.description.as_deref().unwrap_or("")
        );
    }
}
