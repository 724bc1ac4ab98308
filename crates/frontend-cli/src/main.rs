//! LS-8 emulator frontend v0.3.0.
//!
//! Provides three execution modes:
//!
//! - **Run mode** (default): Load a `.ls8` image, run to HLT, print PRN
//!   output on stdout.
//! - **Step mode** (`--step`): Interactive instruction-level debugger with
//!   watchpoints, RAM viewer, and save states.
//! - **Trace mode** (`--trace`): One TRACE line per cycle on stderr.
//!
//! Diagnostics (`--break`, `--profile`, `--dump`) compose with run mode.

use ls8_core::debugger::WatchKind;
use ls8_core::{savestate, Ls8, MEM_SIZE};
use std::env;
use std::fs;
use std::io::Write;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("LS-8 Emulator v0.3.0 - Rust");
        eprintln!("Usage: {} <file.ls8> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --trace              Print a TRACE line per cycle on stderr");
        eprintln!("  --step               Interactive step debugger");
        eprintln!("  --break <addr>       Breakpoint at hex address (repeatable)");
        eprintln!("  --watch <addr>[:r|w] Watchpoint at hex address (repeatable, default w)");
        eprintln!("  --max-cycles N       Stop after N cycles (default unlimited)");
        eprintln!("  --profile            Print a profiler report after the run");
        eprintln!("  --dump               Print RAM and registers after the run");
        eprintln!("  --debug              Show load/breakpoint diagnostics");
        std::process::exit(1);
    }

    let program_path = &args[1];
    let trace = args.iter().any(|a| a == "--trace");
    let step_mode = args.iter().any(|a| a == "--step");
    let profile = args.iter().any(|a| a == "--profile");
    let dump = args.iter().any(|a| a == "--dump");
    let debug = args.iter().any(|a| a == "--debug");

    let max_cycles: u64 = args.iter()
        .position(|a| a == "--max-cycles")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(u64::MAX);

    let text = match fs::read_to_string(program_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ls8: {}: {}", program_path, e);
            std::process::exit(1);
        }
    };

    let mut ls8 = Ls8::new();
    ls8.trace_enabled = trace;
    let size = match ls8.load_image(&text) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("ls8: {}: {}", program_path, e);
            std::process::exit(1);
        }
    };
    if debug { println!("Loaded {} bytes into RAM", size); }

    // Parse breakpoints and watchpoints
    {
        let mut i = 0;
        while i < args.len() {
            if args[i] == "--break" {
                if let Some(s) = args.get(i + 1) {
                    match parse_addr(s) {
                        Some(addr) => {
                            ls8.breakpoints.push(addr);
                            if debug { println!("Breakpoint: 0x{:02X}", addr); }
                        }
                        None => eprintln!("Warning: bad breakpoint address {:?}", s),
                    }
                }
                i += 2;
            } else if args[i] == "--watch" {
                if let Some(s) = args.get(i + 1) {
                    match parse_watch(s) {
                        Some((addr, kind)) => {
                            ls8.debugger.add_watchpoint(addr, kind);
                            if debug { println!("Watchpoint: 0x{:02X} {:?}", addr, kind); }
                        }
                        None => eprintln!("Warning: bad watchpoint {:?}", s),
                    }
                }
                i += 2;
            } else { i += 1; }
        }
    }

    if profile {
        ls8.profiler.start(0);
    }

    if step_mode {
        run_step_mode(&mut ls8, program_path, max_cycles);
    } else {
        run_to_halt(&mut ls8, max_cycles);
    }

    if profile {
        ls8.profiler.stop(ls8.cpu.tick);
        eprintln!("{}", ls8.profiler_report());
    }
    if dump {
        eprintln!("{}", ls8.dump_regs());
        eprint!("{}", ls8.dump_ram(0, MEM_SIZE));
    }
}

/// Parse a hex address, with or without a `0x` prefix.
fn parse_addr(s: &str) -> Option<usize> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    usize::from_str_radix(s, 16).ok().filter(|&a| a < MEM_SIZE)
}

/// Parse `addr`, `addr:r`, `addr:w`, or `addr:rw`.
fn parse_watch(s: &str) -> Option<(usize, WatchKind)> {
    let (addr_s, kind_s) = match s.split_once(':') {
        Some((a, k)) => (a, k),
        None => (s, "w"),
    };
    let kind = match kind_s {
        "r" => WatchKind::Read,
        "w" => WatchKind::Write,
        "rw" => WatchKind::ReadWrite,
        _ => return None,
    };
    Some((parse_addr(addr_s)?, kind))
}

// ─── Run Mode ───────────────────────────────────────────────────────────────

fn run_to_halt(ls8: &mut Ls8, max_cycles: u64) {
    loop {
        let result = ls8.run_for(max_cycles.saturating_sub(ls8.cpu.tick));
        flush_output(ls8);
        match result {
            Ok(()) => {}
            Err(e) => {
                eprintln!("ls8: fatal: {}", e);
                std::process::exit(1);
            }
        }
        if ls8.breakpoint_hit {
            report_stop(ls8);
            ls8.breakpoint_hit = false;
            ls8.debugger.take_hit();
            // Step over the stop point, then keep going.
            if ls8.cpu.running {
                if let Err(e) = ls8.step() {
                    eprintln!("ls8: fatal: {}", e);
                    std::process::exit(1);
                }
                continue;
            }
        }
        break;
    }
}

/// Print what stopped the run: a breakpoint PC or a watchpoint hit.
fn report_stop(ls8: &mut Ls8) {
    if let Some(hit) = ls8.debugger.take_hit() {
        let access = match hit.access {
            WatchKind::Read => "read",
            _ => "write",
        };
        eprintln!(
            "*** Watchpoint [{}]: {} 0x{:02X} ({:02X} → {:02X}) ***",
            hit.index, access, hit.addr, hit.old_val, hit.new_val
        );
    } else {
        eprintln!("*** Breakpoint: {} ***", ls8.disasm_at_pc());
    }
    eprintln!("{}", ls8.dump_regs());
}

fn flush_output(ls8: &mut Ls8) {
    let out = ls8.take_output();
    if !out.is_empty() {
        let _ = std::io::stdout().write_all(&out);
        let _ = std::io::stdout().flush();
    }
}

// ─── Step Mode ──────────────────────────────────────────────────────────────

fn run_step_mode(ls8: &mut Ls8, program_path: &str, max_cycles: u64) {
    println!("Step mode: Enter=step, N<enter>=step N, r=run to break, d=dump,");
    println!("           m [addr [len]]=RAM view, w <addr>[:r|w]=watch, save, load, q=quit");
    println!("{}", ls8.dump_regs());
    println!("Next: {}", ls8.disasm_at_pc());
    ls8.cpu.running = true;

    let stdin = std::io::stdin();
    let mut steps = 0usize;
    loop {
        let mut line = String::new();
        print!("step> ");
        let _ = std::io::stdout().flush();
        if stdin.read_line(&mut line).is_err() || line.is_empty() { break; }
        let cmd = line.trim();
        match cmd {
            "q" | "quit" => break,
            "d" | "dump" => { println!("{}", ls8.dump_regs()); continue; }
            "w" | "watch" => { print!("{}", ls8.debugger.list_watchpoints()); continue; }
            "save" => {
                let path = savestate::state_path(program_path);
                match savestate::save_to_file(&ls8.save_state(), path.as_ref()) {
                    Ok(()) => println!("Saved: {}", path),
                    Err(e) => eprintln!("Save error: {}", e),
                }
                continue;
            }
            "load" => {
                let path = savestate::state_path(program_path);
                match savestate::load_from_file(path.as_ref()).and_then(|s| ls8.apply_state(&s)) {
                    Ok(()) => {
                        println!("Loaded: {}", path);
                        println!("{}", ls8.dump_regs());
                        println!("Next: {}", ls8.disasm_at_pc());
                    }
                    Err(e) => eprintln!("Load error: {}", e),
                }
                continue;
            }
            "r" | "run" => {
                if !ls8.cpu.running {
                    println!("Halted.");
                    continue;
                }
                let budget = max_cycles.saturating_sub(ls8.cpu.tick);
                if let Err(e) = ls8.run_for(budget) {
                    eprintln!("ls8: fatal: {}", e);
                    break;
                }
                flush_output(ls8);
                if ls8.breakpoint_hit {
                    report_stop(ls8);
                    ls8.breakpoint_hit = false;
                } else if !ls8.cpu.running {
                    println!("Halted.");
                }
                println!("{}", ls8.dump_regs());
                println!("Next: {}", ls8.disasm_at_pc());
                continue;
            }
            _ => {}
        }

        if let Some(rest) = cmd.strip_prefix("m") {
            // RAM view: "m", "m F0", "m F0 20"
            let mut parts = rest.split_whitespace();
            let start = parts.next().and_then(parse_addr).unwrap_or(0);
            let len = parts.next()
                .and_then(|s| usize::from_str_radix(s, 16).ok())
                .unwrap_or(64);
            print!("{}", ls8.dump_ram(start, len));
            continue;
        }
        if let Some(rest) = cmd.strip_prefix("w ") {
            match parse_watch(rest.trim()) {
                Some((addr, kind)) => {
                    let idx = ls8.debugger.add_watchpoint(addr, kind);
                    println!("Watchpoint [{}]: 0x{:02X}", idx, addr);
                }
                None => eprintln!("Bad watchpoint {:?}", rest),
            }
            continue;
        }

        let n: usize = cmd.parse().unwrap_or(1);
        for i in 0..n {
            if !ls8.cpu.running {
                println!("Halted.");
                break;
            }
            match ls8.step_one() {
                Ok(asm) => {
                    steps += 1;
                    if n <= 20 { println!("  {}", asm); }
                    else if i == n - 1 { println!("  ... {} steps, last: {}", n, asm); }
                }
                Err(e) => {
                    eprintln!("ls8: fatal: {}", e);
                    ls8.cpu.running = false;
                    break;
                }
            }
        }
        flush_output(ls8);
        println!("{}", ls8.dump_regs());
        println!("Next: {}", ls8.disasm_at_pc());
    }
    println!("Total: {} steps, {} cycles", steps, ls8.cpu.tick);
}
