//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a slice of the driver
//! lifecycle against mock bus and VM adapters.  All tests run on the host
//! with no real hardware required.

mod mock_bus;
