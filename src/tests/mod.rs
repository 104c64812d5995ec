//! Scenario tests driving the whole rendering pipeline.
