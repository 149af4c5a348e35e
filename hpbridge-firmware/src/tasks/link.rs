//! Register link task
//!
//! Serves register reads and writes over the framed serial link, one
//! request at a time. A write answers only once its operation is over,
//! polling the appliance driver every `poll_period_ms` in between without
//! holding the lock.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embassy_time::Timer;
use embedded_io_async::{Read, Write};

use hpbridge_core::registers::{read_register, start_error_code, Command};
use hpbridge_protocol::link::MAX_LINK_FRAME;
use hpbridge_protocol::{LinkErrorCode, LinkParser, LinkRequest, LinkResponse};

use crate::channels::SharedAppliance;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

#[embassy_executor::task]
pub async fn link_task(mut uart: BufferedUart, appliance: &'static SharedAppliance) {
    info!("Register link task started");

    let mut parser = LinkParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match uart.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            let response = match parser.feed(byte) {
                Ok(Some(frame)) => match LinkRequest::from_frame(&frame) {
                    Ok(request) => handle_request(request, appliance).await,
                    Err(e) => {
                        warn!("Bad link request: {:?}", e);
                        LinkResponse::Error(LinkErrorCode::Malformed)
                    }
                },
                Ok(None) => continue,
                Err(e) => {
                    warn!("Link frame error: {:?}", e);
                    LinkResponse::Error(LinkErrorCode::Malformed)
                }
            };
            send_response(&mut uart, &response).await;
        }
    }
}

async fn handle_request(request: LinkRequest, appliance: &'static SharedAppliance) -> LinkResponse {
    match request {
        LinkRequest::Read { address } => {
            let guard = appliance.lock().await;
            match read_register(&*guard, address) {
                Ok(value) => LinkResponse::Value { address, value },
                Err(e) => {
                    warn!("Read {} refused: {:?}", address, e);
                    LinkResponse::Error(e.into())
                }
            }
        }
        LinkRequest::Write { address, value } => handle_write(address, value, appliance).await,
    }
}

async fn handle_write(address: u16, value: u16, appliance: &'static SharedAppliance) -> LinkResponse {
    let (command, ticket, poll_period_ms) = {
        let mut guard = appliance.lock().await;
        let command = match Command::parse(address, value, guard.config()) {
            Ok(command) => command,
            Err(e) => {
                warn!("Write {} = {} refused: {:?}", address, value, e);
                return LinkResponse::Error(e.into());
            }
        };
        match guard.begin(command.operation) {
            Ok(ticket) => {
                info!("Write {} = {}, timeout {} ms", address, value, ticket.timeout_ms());
                (command, ticket, guard.config().poll_period_ms)
            }
            Err(e) => {
                warn!("Write {} = {} not started: {:?}", address, value, e);
                return LinkResponse::Error(start_error_code(e));
            }
        }
    };

    loop {
        Timer::after_millis(poll_period_ms as u64).await;
        if let Some(result) = appliance.lock().await.poll(&ticket) {
            return LinkResponse::Value {
                address,
                value: command.reply(result),
            };
        }
    }
}

async fn send_response(uart: &mut BufferedUart, response: &LinkResponse) {
    let mut out = [0u8; MAX_LINK_FRAME];
    let len = match response.to_frame().and_then(|frame| frame.encode(&mut out)) {
        Ok(len) => len,
        Err(e) => {
            error!("Failed to encode response: {:?}", e);
            return;
        }
    };
    if let Err(e) = uart.write_all(&out[..len]).await {
        warn!("UART write error: {:?}", e);
    }
}
