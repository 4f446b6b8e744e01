/// Elevation primitives for Windows.
///
/// Deleting under protected system paths and running package maintenance
/// both need administrator rights; the queries here feed the elevation
/// collaborator's pre-checks.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token_handle = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token_handle).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut return_length = 0u32;
        let result = GetTokenInformation(
            token_handle,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut return_length,
        );
        let _ = CloseHandle(token_handle);

        result.is_ok() && elevation.TokenIsElevated != 0
    }
}

/// Relaunch the current executable through the UAC "runas" verb.
///
/// On success the new elevated instance is already starting and the caller
/// is expected to exit; ShellExecute gives no handle to wait on.
#[cfg(windows)]
pub fn restart_elevated() -> Result<(), String> {
    use windows::core::{w, HSTRING, PCWSTR};
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    let exe = std::env::current_exe()
        .map_err(|e| format!("cannot locate the current executable: {e}"))?;
    let exe = HSTRING::from(exe.as_os_str());

    let instance = unsafe {
        ShellExecuteW(
            None,
            w!("runas"),
            &exe,
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };
    // ShellExecute reports success as a value greater than 32.
    if instance.0 as isize > 32 {
        Ok(())
    } else {
        Err(format!(
            "ShellExecute(runas) failed with code {}",
            instance.0 as isize
        ))
    }
}

#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}

#[cfg(not(windows))]
pub fn restart_elevated() -> Result<(), String> {
    Err("elevated restart is only supported on Windows".to_owned())
}
