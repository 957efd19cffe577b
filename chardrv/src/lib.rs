//! # Chardrv
//!
//! This library provides an interrupt-driven, line-oriented character driver for UART-class
//! peripherals in no_std RTOS environments. Task code writes strings and reads complete lines
//! through blocking calls, while the peripheral is driven one byte per interrupt. Storage is
//! static, no dynamic memory allocation is required.
//!
//! The RTOS is accessed through the primitive layer of the `chardrv-os` crate. The
//! `chardrv-host` crate binds it to std threads for tests and simulation.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────────────────────────────────┐
//!                │               Char driver                │
//!  ┌──────┐      │  ┌───────────┐      ┌──────────────────┐ │
//!  │      ├─────►│  │ Task lock │      │  Transmit pump   │ │      ┌─────────────┐
//!  │ Port │write │  └───────────┘      │ Idle/Armed/Step  │◄┼──────┤             │
//!  │      │      │  ┌────────────┐     └──────────────────┘ │ step │ Interrupts  │
//!  │      │◄─────┤  │ Completion │◄──── exhausted           │      │             │
//!  └──────┘ line │  └────────────┘     ┌──────────────────┐ │ byte │             │
//!                │  ┌─────────────┐    │  Receive funnel  │◄┼──────┤             │
//!                │  │ Line signal │◄───┤  Framer + queue  │ │      └─────────────┘
//!                │  └─────────────┘    └──────────────────┘ │
//!                └──────────────────────────────────────────┘
//! ```
//! Components:
//! * _Port_ is the task-side handle. It serializes `write` and `readline` calls with a task
//!   lock held for the whole call.
//! * _Interrupts_ is the interrupt-side handle. The caller's interrupt vectors forward the
//!   transmit-ready event and every received byte to it.
//! * _Transmit pump_ walks one armed string per transmit interrupt and fires the completion
//!   event when the string is exhausted.
//! * _Receive funnel_ feeds received bytes into the framer and gives the line signal once per
//!   completed line.
//! * _Framer_ accumulates bytes into lines according to the terminator and exceptional
//!   character sets of [`config::Config`].
//!
//! ## Concurrency model
//!
//! The transmit cursor is shared without a lock. Its ownership moves between the task and the
//! interrupt handler through an atomic state word, so each side touches it only in its own
//! phase. The framer is guarded by a critical section whose duration is bounded by the line
//! length. All other task/interrupt handoffs go through the semaphore and event group of the
//! primitive layer.
//!
//! Strings passed to `write` are streamed directly from the caller's buffers, no copy is made.
//! The buffers stay borrowed until the call returns.
//!
//! ## Limitations
//!
//! * One transmission is in flight at a time.
//! * `write` blocks until the peripheral takes every byte. Use `try_write` to bound the wait.
#![no_std]

pub use chardrv_core as core;
pub use chardrv_os as os;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod driver;
pub mod framer;
mod funnel;
mod pump;
