//! A scripted engine session for demo mode: stands in for the instrumented
//! SQL engine by pushing a plausible mutation stream into the event channel
//! with human-watchable pacing.

use std::thread;
use std::time::Duration;

use crate::events::source::EventSender;

const STEP_MS: u64 = 350;
const SESSION_PAUSE_MS: u64 = 4000;

/// Spawn the demo producer. It emits forever; dropping the visualizer's
/// source ends it silently on the next emit.
pub fn spawn(sender: EventSender) {
    thread::spawn(move || {
        loop {
            session(&sender);
            thread::sleep(Duration::from_millis(SESSION_PAUSE_MS));
        }
    });
}

fn session(sender: &EventSender) {
    let step = Duration::from_millis(STEP_MS);
    let mut emit = |code: i32, payload: String| {
        sender.emit(code, payload);
        thread::sleep(step);
    };

    emit(0, r#"{"pageSize":4096,"numPages":1}"#.to_string());
    emit(8, r#"{"sql":"INSERT INTO t(k) VALUES (...)"}"#.to_string());
    emit(10, r#"{"success":1}"#.to_string());
    emit(11, r#"{"numOpcodes":14}"#.to_string());

    // Fill the root until it splits.
    for i in 0..5 {
        emit(2, format!(r#"{{"page":1,"cell":{i},"keyLen":{}}}"#, 12 + i * 4));
    }
    emit(6, r#"{"page":2,"type":13}"#.to_string());
    emit(4, r#"{"originalPage":1,"newPage":2,"splitCell":2}"#.to_string());
    emit(5, r#"{"page":1,"numCells":2}"#.to_string());

    // Grow the right side, then split it too.
    for i in 0..3 {
        emit(2, format!(r#"{{"page":2,"cell":{},"keyLen":20}}"#, 3 + i));
    }
    emit(4, r#"{"originalPage":2,"newPage":3,"splitCell":3}"#.to_string());

    // A second child under the root.
    emit(2, r#"{"page":1,"cell":2,"keyLen":16}"#.to_string());
    emit(4, r#"{"originalPage":1,"newPage":4,"splitCell":2}"#.to_string());

    // Deletes, then a page going away entirely.
    emit(3, r#"{"page":2,"cell":1}"#.to_string());
    emit(3, r#"{"page":3,"cell":0}"#.to_string());
    emit(7, r#"{"page":3}"#.to_string());
    emit(13, r#"{"resultCode":0}"#.to_string());
}
