//! Build a fleet overview from sessions stored as JSON files.
//!
//! Run with: cargo run --example fleet_overview [SESSION_DIR]
//!
//! Without an argument a few synthetic sessions are written to a temporary
//! directory first.

use std::path::PathBuf;

use drive_analytics::{
    GpsSample, JsonDirSessionStore, RawTags, ReviewMarker, Session, SessionAnalyzer, SessionStore,
};
use serde_json::json;

fn synthetic_session(id: &str, day: u32, hard_stops: usize) -> Session {
    let mut session = Session::new(id);
    session.start_time = Some(format!("2024-05-{:02}T09:00:00Z", day));
    session.total_duration_min = Some(25.0 + day as f64);
    session.total_distance_km = Some(12.0);

    let mut t = 0;
    for i in 0..=(hard_stops * 2 + 4) {
        let speed = if i % 2 == 1 && i <= hard_stops * 2 { 2.0 } else { 14.0 };
        session.gps_points.push(GpsSample::new(
            52.5200 + i as f64 * 0.0005,
            13.4050,
            &format!("2024-05-{:02}T09:00:{:02}Z", day, t),
            Some(speed),
        ));
        t += 3;
    }

    session.review_markers.push(ReviewMarker {
        latitude: Some(52.5201 + day as f64 * 0.00001),
        longitude: Some(13.4049),
        label: Some("Roundabout entry".into()),
        tags: Some(RawTags::List(vec![json!("roundabout"), json!("yield")])),
        ..Default::default()
    });
    session
}

fn main() -> drive_analytics::Result<()> {
    let dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let dir = std::env::temp_dir().join("drive-analytics-demo");
            let store = JsonDirSessionStore::open(&dir)?;
            for (day, stops) in [(1, 3), (2, 1), (3, 0)] {
                store.save(&synthetic_session(&format!("demo-{day}"), day, stops))?;
            }
            dir
        }
    };

    let analyzer = SessionAnalyzer::new(JsonDirSessionStore::open(&dir)?);
    let overview = analyzer.overview()?;

    println!("Fleet overview for {} ({} routes)\n", dir.display(), overview.routes_count);

    println!("Hotspots:");
    for hotspot in &overview.heatmap {
        println!(
            "   {:<14} {:>3} events at ({:.5}, {:.5}) tag={}",
            hotspot.dominant_label,
            hotspot.count,
            hotspot.latitude,
            hotspot.longitude,
            hotspot.dominant_tag.as_deref().unwrap_or("-")
        );
    }

    println!("\nTrends:");
    for row in &overview.practice_trends.sessions {
        println!(
            "   {} {:<8} harsh={} safety={:.1}",
            row.recorded_at.as_deref().unwrap_or("undated"),
            row.route_id,
            row.harsh_events,
            row.safety_score
        );
    }
    println!("   Safety index: {:.1}", overview.practice_trends.summary.safety_index);

    println!("\nRecommended focus:");
    for rec in &overview.recommended_segments {
        println!("   {} - {} (routes: {})", rec.label, rec.reason, rec.routes.join(", "));
    }

    Ok(())
}
