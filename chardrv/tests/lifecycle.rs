use chardrv::core::Timeout;
use chardrv::driver::CharDriver;
use chardrv::framer::LineFramer;
use chardrv::os::{FnHooks, SerialHooks};
use chardrv_host::{HostOs, SimUart};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn test_interrupt_lines() {
    let uart = SimUart::new();
    uart.enable_tx_interrupt();
    uart.enable_rx_interrupt();

    {
        let mut driver = CharDriver::<HostOs, _, _>::new(&uart, LineFramer::<64, 16>::default());
        assert!(!uart.tx_enabled());
        assert!(!uart.rx_enabled());

        let (port, interrupts) = driver.split();
        assert!(uart.rx_enabled());
        assert!(!uart.tx_enabled());

        uart.inject(b"bye\n", |b| interrupts.receive_byte(b));
        assert_eq!(port.readline(Timeout::ZERO).as_bytes(), b"bye");
    }

    assert!(!uart.rx_enabled());
    assert!(!uart.tx_enabled());
}

#[test]
fn test_bytes_before_split_are_lost() {
    let uart = SimUart::new();
    let mut driver = CharDriver::<HostOs, _, _>::new(&uart, LineFramer::<64, 16>::default());

    assert_eq!(uart.inject(b"early\n", |_| unreachable!()), 0);

    let (port, _) = driver.split();
    assert!(port.readline(Timeout::ZERO).is_empty());
}

#[test]
fn test_split_again_after_handles_dropped() {
    let uart = SimUart::new();
    let mut driver = CharDriver::<HostOs, _, _>::new(&uart, LineFramer::<64, 16>::default());

    {
        let (_, interrupts) = driver.split();
        uart.inject(b"kept\n", |b| interrupts.receive_byte(b));
    }

    let (port, _) = driver.split();
    assert_eq!(port.readline(Timeout::ZERO).as_bytes(), b"kept");
}

static TX_ENABLED: AtomicBool = AtomicBool::new(true);
static RX_ENABLED: AtomicBool = AtomicBool::new(true);
static EVENTS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn log_event(event: &'static str) {
    EVENTS.lock().unwrap().push(event);
}

const FN_HOOKS: FnHooks = FnHooks {
    tx_interrupt_enabler: || {
        log_event("tx on");
        TX_ENABLED.store(true, Ordering::SeqCst);
    },
    tx_interrupt_disabler: || {
        log_event("tx off");
        TX_ENABLED.store(false, Ordering::SeqCst);
    },
    rx_interrupt_enabler: || {
        log_event("rx on");
        RX_ENABLED.store(true, Ordering::SeqCst);
    },
    rx_interrupt_disabler: || {
        log_event("rx off");
        RX_ENABLED.store(false, Ordering::SeqCst);
    },
    byte_sender: |_| log_event("byte"),
};

#[test]
fn test_fn_hooks_ordering() {
    {
        let framer = LineFramer::<16, 2>::default();
        let mut driver = CharDriver::<HostOs, _, _>::new(FN_HOOKS, framer);
        assert!(!TX_ENABLED.load(Ordering::SeqCst));
        assert!(!RX_ENABLED.load(Ordering::SeqCst));

        let (port, interrupts) = driver.split();
        assert!(RX_ENABLED.load(Ordering::SeqCst));

        // Drive the transmit vector by hand: one byte, then completion
        std::thread::scope(|s| {
            s.spawn(|| {
                while !TX_ENABLED.load(Ordering::SeqCst) {
                    std::thread::yield_now();
                }
                interrupts.transmit_step();
                interrupts.transmit_step();
            });
            port.write(["x"]);
        });
    }

    assert_eq!(
        *EVENTS.lock().unwrap(),
        ["tx off", "rx off", "rx on", "tx on", "byte", "tx off", "rx off", "tx off"]
    );
}
