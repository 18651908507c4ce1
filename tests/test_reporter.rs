/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use mtxrank::prelude::*;
use signal_hook::consts::signal::SIGUSR1;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_reporter_lifecycle() -> Result<()> {
    let monitor = Arc::new(Monitor::new());
    assert_eq!(monitor.status(), Status::NotStarted);

    let reporter = Reporter::spawn(Arc::clone(&monitor))?;
    // Nothing to report yet, but the reporter must answer and stay alive.
    signal_hook::low_level::raise(SIGUSR1)?;
    std::thread::sleep(Duration::from_millis(100));
    reporter.shutdown()?;
    Ok(())
}
