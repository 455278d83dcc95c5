use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Split a slice into batches of at most `size` items
pub fn chunks<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.max(1))
}

/// Quote a string for a POSIX shell, e.g. `it's` -> `'it'\''s'`
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Truncate output to a maximum number of lines
pub fn truncate_lines(s: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    if lines.len() <= max_lines {
        s.to_string()
    } else {
        let truncated: Vec<&str> = lines[..max_lines].to_vec();
        format!("{}\n... ({} more lines)", truncated.join("\n"), lines.len() - max_lines)
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(
    host: &str,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<ssh2::Session, String> {
    let addr = if host.contains(':') && !host.starts_with('[') {
        host.to_string()
    } else {
        format!("{}:22", host)
    };
    let socket = addr
        .to_socket_addrs()
        .map_err(|e| format!("Invalid address {}: {}", addr, e))?
        .next()
        .ok_or_else(|| format!("Invalid address {}: no socket address", addr))?;
    let tcp = TcpStream::connect_timeout(&socket, Duration::from_secs(timeout_secs))
        .map_err(|e| format!("TCP connection to {} failed: {}", addr, e))?;

    tcp.set_read_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();
    tcp.set_write_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| format!("Failed to create SSH session: {}", e))?;
    session.set_tcp_stream(tcp);
    session.set_timeout((timeout_secs * 1000).min(u32::MAX as u64) as u32);
    session.handshake()
        .map_err(|e| format!("SSH handshake with {} failed: {}", addr, e))?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    let mut prompter = PasswordPrompt { password: pass.to_string() };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err(format!("SSH authentication to {} failed: all methods exhausted", addr))
    }
}

/// Connect via SSH, run a single command and return (exit status, stdout).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_exec(
    host: &str,
    user: &str,
    pass: &str,
    command: &str,
    timeout_secs: u64,
) -> Result<(i32, String), String> {
    let session = ssh_connect(host, user, pass, timeout_secs)?;

    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel.exec(command)
        .map_err(|e| format!("Failed to execute command: {}", e))?;

    let mut output = String::new();
    channel.read_to_string(&mut output)
        .map_err(|e| format!("Failed to read output: {}", e))?;

    channel.wait_close()
        .map_err(|e| format!("Failed to close channel: {}", e))?;

    let status = channel.exit_status()
        .map_err(|e| format!("Failed to read exit status: {}", e))?;

    Ok((status, output))
}

/// Async wrapper for ssh_exec - runs in a blocking thread pool
pub async fn ssh_exec_async(
    host: &str,
    user: &str,
    pass: &str,
    command: &str,
    timeout_secs: u64,
) -> Result<(i32, String), String> {
    let host = host.to_string();
    let user = user.to_string();
    let pass = pass.to_string();
    let command = command.to_string();

    tokio::task::spawn_blocking(move || {
        ssh_exec(&host, &user, &pass, &command, timeout_secs)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}
