// SPDX-License-Identifier: MIT OR Apache-2.0

mod opt;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use i40e_nvm::helpers::logger;
use i40e_nvm::patch::Patcher;
use i40e_nvm::{
    channel, locate_phy_cap, read_emp_sr_pointer, read_phy_cap_block, DriverChannel, Error, Nvm,
    Step,
};
use log::{info, warn};
use opt::{Mode, Opt};
use std::io::{self, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

/// Dump PHY Capability data structure 0.
///
/// Each pointer is printed as soon as it is known, so a failed read still
/// leaves the part of the chain that was walked on `out`.
fn show<C: DriverChannel>(nvm: &mut Nvm<C>, out: &mut impl Write) -> Result<()> {
    let emp_sr = read_emp_sr_pointer(nvm)?;
    writeln!(out, "EMP SR: {emp_sr:#06x}")?;
    let pointers = locate_phy_cap(nvm, emp_sr)?;
    writeln!(out, "PHY CAP DATA OFFSET: {}", pointers.offset)?;

    let block = read_phy_cap_block(nvm, pointers.offset)?;
    if !block.section_length_ok() {
        warn!(
            "section length is {:#06x}; this NVM layout may not be supported",
            block.section_length()
        );
    }
    write!(out, "{}", block.listing(pointers.offset))?;
    Ok(())
}

/// Clear the unlock bit on every lane, calling `pause` after each write.
fn unlock<C: DriverChannel>(
    nvm: &mut Nvm<C>,
    out: &mut impl Write,
    pause: impl FnMut(Duration),
) -> Result<()> {
    let mut printed = Ok(());
    let report = Patcher::new(nvm).with_pause(pause).run(|outcome| {
        if printed.is_ok() {
            printed = writeln!(out, "{outcome}");
        }
    });
    let report = report?;
    printed?;

    if report.checksum_updated {
        writeln!(out, "NVM successfully updated")?;
    } else {
        info!("all lanes already unlocked, NVM left untouched");
    }
    Ok(())
}

/// Exit status identifying the step that failed.
///
/// Opening the channel and walking the pointer chain use the same codes in
/// both modes. The remaining steps are numbered per mode. `1` covers
/// everything without a dedicated code.
fn exit_code(mode: Mode, err: &anyhow::Error) -> u8 {
    let Some(err) = err.downcast_ref::<Error>() else {
        return 1;
    };
    let err = match err {
        Error::Resolve(inner) => &**inner,
        other => other,
    };
    match err {
        Error::ChannelOpen { .. } | Error::InvalidInterfaceName(_) | Error::Unsupported => 2,
        Error::UnsupportedLayout(_) => 6,
        Error::Transport { step, .. } => match (mode, step) {
            (_, Step::EmpSrPointer) => 3,
            (_, Step::PhyCapPointer) => 4,
            (Mode::Show, Step::PhyCapBlock) => 5,
            (Mode::Unlock, Step::ReadMisc0(_)) => 7,
            (Mode::Unlock, Step::WriteMisc0(_)) => 8,
            (Mode::Unlock, Step::Checksum) => 9,
            _ => 1,
        },
        _ => 1,
    }
}

fn main() -> ExitCode {
    let opt = match Opt::try_parse() {
        Ok(opt) => opt,
        Err(err) => {
            if !matches!(err.kind(), clap::error::ErrorKind::DisplayHelp) {
                eprintln!("{err}");
            }
            let _ = Opt::command().print_help();
            return ExitCode::SUCCESS;
        }
    };

    // Ignore the error: it only means a logger is already installed.
    let _ = logger::init(opt.log_level());

    let Some(mode) = opt.mode() else {
        let _ = Opt::command().print_help();
        return ExitCode::SUCCESS;
    };
    let Some(ifname) = opt.ifname.as_deref() else {
        eprintln!("i40e-unlock: ifname is required");
        return ExitCode::from(1);
    };

    let res = channel::open(ifname)
        .map_err(anyhow::Error::from)
        .and_then(|channel| {
            let mut nvm = Nvm::new(channel);
            let mut out = io::stdout().lock();
            match mode {
                Mode::Show => show(&mut nvm, &mut out)
                    .with_context(|| format!("failed to read PHY Capability data from {ifname}")),
                Mode::Unlock => unlock(&mut nvm, &mut out, thread::sleep)
                    .with_context(|| format!("failed to unlock {ifname}")),
            }
        });
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("i40e-unlock: {err:#}");
            ExitCode::from(exit_code(mode, &err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use i40e_nvm::layout::{misc0_offset, EMP_SR_SETTINGS_PTR, LANE_COUNT};
    use i40e_nvm::{dump_phy_cap_block, ShadowRam, WordOffset};
    use std::collections::HashSet;

    const PHY_CAP: WordOffset = WordOffset(0x002e);

    /// EMP SR pointer 0x0010 and LAN 0 pointer 0x0005, with the given Misc0
    /// values on the four lanes.
    fn adapter(misc0: [u16; 4]) -> ShadowRam {
        let mut sr = ShadowRam::new(0x100);
        sr.set_word(EMP_SR_SETTINGS_PTR, 0x0010)
            .set_word(WordOffset(0x0029), 0x0005)
            .set_word(PHY_CAP, 0x000b)
            .set_word(WordOffset(0x0038), 0x0a1e);
        for (lane, value) in (0..LANE_COUNT).zip(misc0) {
            sr.set_word(misc0_offset(PHY_CAP, lane), value);
        }
        sr
    }

    fn run_show(sr: &mut ShadowRam) -> (Result<()>, String) {
        let mut out = Vec::new();
        let res = show(&mut Nvm::new(sr), &mut out);
        (res, String::from_utf8(out).unwrap())
    }

    fn run_unlock(sr: &mut ShadowRam) -> (Result<()>, String, Vec<Duration>) {
        let mut out = Vec::new();
        let mut pauses = Vec::new();
        let res = unlock(&mut Nvm::new(sr), &mut out, |pause| pauses.push(pause));
        (res, String::from_utf8(out).unwrap(), pauses)
    }

    fn transport(step: Step) -> Error {
        Error::Transport {
            step,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
    }

    #[test]
    fn test_show_listing() {
        let mut sr = adapter([0x0800, 0, 0, 0]);
        let (res, text) = run_show(&mut sr);
        res.unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 16);
        assert_eq!(
            lines[..3],
            [
                "EMP SR: 0x0010",
                "PHY CAP DATA OFFSET: 0x002e",
                "PHY Capability data structure 0:",
            ]
        );
        assert_eq!(
            lines[11],
            "0000002e  08  0x0800 (PHY Capabilities Misc0) <== will be modified"
        );

        let dump = dump_phy_cap_block(&mut Nvm::new(adapter([0x0800, 0, 0, 0]))).unwrap();
        assert_eq!(text, dump.to_string());
        assert_eq!(sr.writes().count(), 0);
    }

    #[test]
    fn test_show_prints_pointers_before_failure() {
        let mut sr = adapter([0; 4]);
        sr.fail_call(2, io::ErrorKind::PermissionDenied);
        let (res, text) = run_show(&mut sr);
        assert_eq!(text, "EMP SR: 0x0010\nPHY CAP DATA OFFSET: 0x002e\n");
        assert_eq!(exit_code(Mode::Show, &res.unwrap_err()), 5);

        let mut sr = adapter([0; 4]);
        sr.fail_call(1, io::ErrorKind::PermissionDenied);
        let (res, text) = run_show(&mut sr);
        assert_eq!(text, "EMP SR: 0x0010\n");
        assert_eq!(exit_code(Mode::Show, &res.unwrap_err()), 4);

        let mut sr = adapter([0; 4]);
        sr.fail_call(0, io::ErrorKind::PermissionDenied);
        let (res, text) = run_show(&mut sr);
        assert_eq!(text, "");
        assert_eq!(exit_code(Mode::Show, &res.unwrap_err()), 3);
    }

    #[test]
    fn test_show_4k_units_prints_emp_sr() {
        let mut sr = adapter([0; 4]);
        sr.set_word(EMP_SR_SETTINGS_PTR, 0x8005);
        let (res, text) = run_show(&mut sr);
        assert_eq!(text, "EMP SR: 0x8005\n");
        assert_eq!(exit_code(Mode::Show, &res.unwrap_err()), 6);
        assert_eq!(sr.journal().len(), 1);
    }

    #[test]
    fn test_unlock_lane_zero() {
        let mut sr = adapter([0x0800, 0, 0, 0]);
        let (res, text, pauses) = run_unlock(&mut sr);
        res.unwrap();
        assert_eq!(
            text,
            "PHY Capabilities Misc0: 0x0800 -> 0x0000\n\
             PHY Capabilities Misc1: 0x0000 skipped\n\
             PHY Capabilities Misc2: 0x0000 skipped\n\
             PHY Capabilities Misc3: 0x0000 skipped\n\
             NVM successfully updated\n"
        );
        assert_eq!(pauses, [Duration::from_secs(1)]);
        assert_eq!(sr.checksum_updates(), 1);
    }

    #[test]
    fn test_unlock_already_unlocked() {
        let mut sr = adapter([0x0000, 0x07ff, 0xf7ff, 0x1234]);
        let (res, text, pauses) = run_unlock(&mut sr);
        res.unwrap();
        assert_eq!(
            text,
            "PHY Capabilities Misc0: 0x0000 skipped\n\
             PHY Capabilities Misc1: 0x07ff skipped\n\
             PHY Capabilities Misc2: 0xf7ff skipped\n\
             PHY Capabilities Misc3: 0x1234 skipped\n"
        );
        assert!(pauses.is_empty());
        assert_eq!(sr.writes().count(), 0);
    }

    #[test]
    fn test_unlock_failure_keeps_progress() {
        let mut sr = adapter([0x0800; 4]);
        // Calls: 2 pointer reads, lane 0 read + write, lane 1 read + write.
        sr.fail_call(5, io::ErrorKind::PermissionDenied);
        let (res, text, _) = run_unlock(&mut sr);
        assert_eq!(text, "PHY Capabilities Misc0: 0x0800 -> 0x0000\n");
        assert_eq!(exit_code(Mode::Unlock, &res.unwrap_err()), 8);

        let mut sr = adapter([0x0800; 4]);
        sr.set_word(EMP_SR_SETTINGS_PTR, 0x8005);
        let (res, text, _) = run_unlock(&mut sr);
        assert_eq!(text, "");
        assert_eq!(exit_code(Mode::Unlock, &res.unwrap_err()), 6);
    }

    #[test]
    fn test_show_exit_codes() {
        let codes: Vec<_> = [
            Error::Unsupported,
            transport(Step::EmpSrPointer),
            transport(Step::PhyCapPointer),
            transport(Step::PhyCapBlock),
            Error::UnsupportedLayout(0x8005),
        ]
        .into_iter()
        .map(|err| exit_code(Mode::Show, &err.into()))
        .collect();
        assert_eq!(codes, [2, 3, 4, 5, 6]);
        assert_eq!(
            exit_code(Mode::Show, &Error::InvalidInterfaceName(String::new()).into()),
            2
        );
    }

    #[test]
    fn test_unlock_exit_codes() {
        let resolve = |err| Error::Resolve(Box::new(err));
        let codes: Vec<_> = [
            Error::Unsupported,
            resolve(transport(Step::EmpSrPointer)),
            resolve(transport(Step::PhyCapPointer)),
            resolve(Error::UnsupportedLayout(0x8005)),
            transport(Step::ReadMisc0(1)),
            transport(Step::WriteMisc0(2)),
            transport(Step::Checksum),
        ]
        .into_iter()
        .map(|err| exit_code(Mode::Unlock, &err.into()))
        .collect();
        assert_eq!(codes, [2, 3, 4, 6, 7, 8, 9]);

        let distinct: HashSet<_> = codes.iter().collect();
        assert_eq!(distinct.len(), codes.len());
        assert!(codes.iter().all(|&code| code > 1));
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(transport(Step::PhyCapBlock))
            .context("failed to read PHY Capability data");
        assert_eq!(exit_code(Mode::Show, &err), 5);
        assert_eq!(exit_code(Mode::Show, &anyhow::anyhow!("other")), 1);
    }
}
