//! PowerShell script templates run through the Windows bridge.
//!
//! Every script is self-contained: it declares the Win32 signatures it
//! needs, does one thing, and prints either compact JSON or a single
//! `MARKER:payload` line for the Rust side to parse.

use crate::window::NavigationKey;

pub const SW_HIDE: i32 = 0;
pub const SW_MAXIMIZE: i32 = 3;
pub const SW_MINIMIZE: i32 = 6;
pub const SW_RESTORE: i32 = 9;

pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;

/// Window classes that hold the page content in common document viewers.
pub const CONTENT_WINDOW_CLASSES: &[&str] = &[
    "AVL_AVView",
    "_WwG",
    "Chrome_RenderWidgetHostHWND",
    "SUMATRA_PDF_CANVAS",
    "Internet Explorer_Server",
];

pub const MARKER_NOT_FOUND: &str = "NOT_FOUND";
pub const MARKER_NO_RECT: &str = "NO_RECT";
pub const MARKER_INVALID_GEOMETRY: &str = "INVALID_GEOMETRY:";
pub const MARKER_CAPTURE_FAILED: &str = "CAPTURE_FAILED";
pub const MARKER_PATH: &str = "PATH:";

const WIN32_TYPES: &str = r#"
Add-Type @"
using System;
using System.Text;
using System.Runtime.InteropServices;
public class AutoSnapWin32 {
    public delegate bool EnumWindowsProc(IntPtr hWnd, IntPtr lParam);
    [StructLayout(LayoutKind.Sequential)]
    public struct RECT { public int Left; public int Top; public int Right; public int Bottom; }
    [DllImport("user32.dll")] public static extern bool IsWindow(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern bool IsWindowVisible(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern bool IsIconic(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern bool IsZoomed(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern IntPtr GetForegroundWindow();
    [DllImport("user32.dll")] public static extern bool SetForegroundWindow(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern bool ShowWindow(IntPtr hWnd, int nCmdShow);
    [DllImport("user32.dll")] public static extern bool GetWindowRect(IntPtr hWnd, out RECT rect);
    [DllImport("user32.dll")] public static extern bool PrintWindow(IntPtr hWnd, IntPtr hdc, uint flags);
    [DllImport("user32.dll")] public static extern bool PostMessage(IntPtr hWnd, uint msg, IntPtr wParam, IntPtr lParam);
    [DllImport("user32.dll")] public static extern int GetWindowLong(IntPtr hWnd, int index);
    [DllImport("user32.dll")] public static extern int SetWindowLong(IntPtr hWnd, int index, int value);
    [DllImport("user32.dll")] public static extern bool SetLayeredWindowAttributes(IntPtr hWnd, uint key, byte alpha, uint flags);
    [DllImport("user32.dll")] public static extern bool EnumChildWindows(IntPtr parent, EnumWindowsProc callback, IntPtr lParam);
    [DllImport("user32.dll", CharSet = CharSet.Unicode)] public static extern int GetClassName(IntPtr hWnd, StringBuilder name, int max);
}
"@
"#;

/// Quote a value as a PowerShell single-quoted string literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn probe() -> String {
    "Write-Output 'AUTOSNAP_OK'".to_string()
}

pub fn list_windows() -> String {
    format!(
        r#"{types}
$ErrorActionPreference = 'SilentlyContinue'
Get-Process | Where-Object {{
    $_.MainWindowHandle -ne 0 -and $_.ProcessName -notmatch '^(dwm|csrss|winlogon|wininit)$'
}} | ForEach-Object {{
    $h = $_.MainWindowHandle
    $visible = [AutoSnapWin32]::IsWindowVisible($h)
    $minimized = [AutoSnapWin32]::IsIconic($h)
    if ($visible -or $minimized) {{
        $r = New-Object AutoSnapWin32+RECT
        [void][AutoSnapWin32]::GetWindowRect($h, [ref]$r)
        [pscustomobject]@{{
            hwnd = [int64]$h
            title = $_.MainWindowTitle
            process_name = $_.ProcessName
            pid = $_.Id
            x = $r.Left
            y = $r.Top
            width = $r.Right - $r.Left
            height = $r.Bottom - $r.Top
            visible = [bool]$visible
            minimized = [bool]$minimized
            maximized = [bool][AutoSnapWin32]::IsZoomed($h)
        }}
    }}
}} | ConvertTo-Json -Compress
"#,
        types = WIN32_TYPES
    )
}

pub fn query_state(hwnd: i64) -> String {
    format!(
        r#"{types}
$h = [IntPtr]{hwnd}
if (-not [AutoSnapWin32]::IsWindow($h)) {{ Write-Output '{not_found}'; exit 0 }}
[pscustomobject]@{{
    visible = [bool][AutoSnapWin32]::IsWindowVisible($h)
    minimized = [bool][AutoSnapWin32]::IsIconic($h)
    maximized = [bool][AutoSnapWin32]::IsZoomed($h)
    foreground = ([AutoSnapWin32]::GetForegroundWindow() -eq $h)
}} | ConvertTo-Json -Compress
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        not_found = MARKER_NOT_FOUND
    )
}

pub fn show_window(hwnd: i64, command: i32) -> String {
    format!(
        r#"{types}
$h = [IntPtr]{hwnd}
if (-not [AutoSnapWin32]::IsWindow($h)) {{ Write-Output '{not_found}'; exit 0 }}
[void][AutoSnapWin32]::ShowWindow($h, {command})
Write-Output 'OK'
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        command = command,
        not_found = MARKER_NOT_FOUND
    )
}

pub fn set_foreground(hwnd: i64) -> String {
    format!(
        r#"{types}
$h = [IntPtr]{hwnd}
if (-not [AutoSnapWin32]::IsWindow($h)) {{ Write-Output '{not_found}'; exit 0 }}
if ([AutoSnapWin32]::SetForegroundWindow($h)) {{ Write-Output 'OK' }} else {{ Write-Output 'FAILED' }}
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        not_found = MARKER_NOT_FOUND
    )
}

pub fn foreground_window() -> String {
    format!(
        "{types}\nWrite-Output ([int64][AutoSnapWin32]::GetForegroundWindow())\n",
        types = WIN32_TYPES
    )
}

/// Capture one window to a PNG in the Windows temp directory.
///
/// Tries PrintWindow with PW_RENDERFULLCONTENT first and falls back to
/// copying screen pixels for on-screen windows. A minimized window is
/// restored behind a fully transparent layered style for the capture and
/// minimized again before the script exits.
pub fn capture_window(hwnd: i64, file_stem: &str) -> String {
    format!(
        r#"{types}
Add-Type -AssemblyName System.Drawing
$h = [IntPtr]{hwnd}
if (-not [AutoSnapWin32]::IsWindow($h)) {{ Write-Output '{not_found}'; exit 0 }}
$path = Join-Path $env:TEMP ({stem} + '.png')
$wasMinimized = [AutoSnapWin32]::IsIconic($h)
$style = [AutoSnapWin32]::GetWindowLong($h, -20)
if ($wasMinimized) {{
    [void][AutoSnapWin32]::SetWindowLong($h, -20, ($style -bor 0x80000))
    [void][AutoSnapWin32]::SetLayeredWindowAttributes($h, 0, 1, 2)
    [void][AutoSnapWin32]::ShowWindow($h, {sw_restore})
    Start-Sleep -Milliseconds 250
}}
try {{
    $r = New-Object AutoSnapWin32+RECT
    if (-not [AutoSnapWin32]::GetWindowRect($h, [ref]$r)) {{ Write-Output '{no_rect}'; exit 0 }}
    $w = $r.Right - $r.Left
    $ht = $r.Bottom - $r.Top
    if ($w -le 0 -or $ht -le 0) {{ Write-Output ('{invalid}' + $w + 'x' + $ht); exit 0 }}
    $bmp = New-Object System.Drawing.Bitmap $w, $ht
    $g = [System.Drawing.Graphics]::FromImage($bmp)
    $hdc = $g.GetHdc()
    $printed = [AutoSnapWin32]::PrintWindow($h, $hdc, 2)
    $g.ReleaseHdc($hdc)
    $method = 'print_window'
    if (-not $printed) {{
        if ($wasMinimized) {{ Write-Output '{capture_failed}'; exit 0 }}
        $g.CopyFromScreen($r.Left, $r.Top, 0, 0, $bmp.Size)
        $method = 'copy_from_screen'
    }}
    $bmp.Save($path, [System.Drawing.Imaging.ImageFormat]::Png)
    $g.Dispose()
    $bmp.Dispose()
    Write-Output ('{path_marker}' + $path + '|' + $method)
}} finally {{
    if ($wasMinimized) {{
        [void][AutoSnapWin32]::ShowWindow($h, {sw_minimize})
        [void][AutoSnapWin32]::SetWindowLong($h, -20, $style)
    }}
}}
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        stem = ps_quote(file_stem),
        sw_restore = SW_RESTORE,
        sw_minimize = SW_MINIMIZE,
        not_found = MARKER_NOT_FOUND,
        no_rect = MARKER_NO_RECT,
        invalid = MARKER_INVALID_GEOMETRY,
        capture_failed = MARKER_CAPTURE_FAILED,
        path_marker = MARKER_PATH
    )
}

pub fn capture_full_screen(file_stem: &str) -> String {
    format!(
        r#"Add-Type -AssemblyName System.Windows.Forms, System.Drawing
$b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds
$bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height
$g = [System.Drawing.Graphics]::FromImage($bmp)
$g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size)
$path = Join-Path $env:TEMP ({stem} + '.png')
$bmp.Save($path, [System.Drawing.Imaging.ImageFormat]::Png)
$g.Dispose()
$bmp.Dispose()
Write-Output ('{path_marker}' + $path + '|copy_from_screen')
"#,
        stem = ps_quote(file_stem),
        path_marker = MARKER_PATH
    )
}

/// Post a key press and release directly to the window's message queue,
/// so the window does not need to be foreground.
pub fn send_key(hwnd: i64, key: NavigationKey) -> String {
    format!(
        r#"{types}
$h = [IntPtr]{hwnd}
if (-not [AutoSnapWin32]::IsWindow($h)) {{ Write-Output '{not_found}'; exit 0 }}
$down = [AutoSnapWin32]::PostMessage($h, {keydown}, [IntPtr]{vk}, [IntPtr]1)
Start-Sleep -Milliseconds 30
$up = [AutoSnapWin32]::PostMessage($h, {keyup}, [IntPtr]{vk}, [IntPtr]0xC0000001)
if ($down -and $up) {{ Write-Output 'OK' }} else {{ Write-Output 'FAILED' }}
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        keydown = WM_KEYDOWN,
        keyup = WM_KEYUP,
        vk = key.virtual_key_code(),
        not_found = MARKER_NOT_FOUND
    )
}

/// Print the first descendant whose class holds document content, or 0.
pub fn find_content_child(hwnd: i64) -> String {
    let classes = CONTENT_WINDOW_CLASSES
        .iter()
        .map(|c| ps_quote(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{types}
$h = [IntPtr]{hwnd}
$classes = @({classes})
$script:found = [IntPtr]::Zero
$callback = [AutoSnapWin32+EnumWindowsProc]{{
    param($child, $lparam)
    $name = New-Object System.Text.StringBuilder 256
    [void][AutoSnapWin32]::GetClassName($child, $name, 256)
    if ($classes -contains $name.ToString()) {{ $script:found = $child; return $false }}
    return $true
}}
[void][AutoSnapWin32]::EnumChildWindows($h, $callback, [IntPtr]::Zero)
Write-Output ([int64]$script:found)
"#,
        types = WIN32_TYPES,
        hwnd = hwnd,
        classes = classes
    )
}
