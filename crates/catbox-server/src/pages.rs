//! HTML pages served by the upload handlers

/// Landing page: a drop zone wrapping the upload form.
///
/// Dropping a file, or picking one after clicking the zone, submits the form
/// straight away. Without JavaScript the plain form still works.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>catbox</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 20px; }
        .drop-zone { border: 2px dashed #ccc; padding: 20px; margin: 20px auto; width: 300px; cursor: pointer; }
        .drop-zone.dragover { background-color: #e0e0e0; }
    </style>
</head>
<body>
    <h1>Welcome to catbox</h1>
    <div id="drop-zone" class="drop-zone">
        <p>Drag and drop a file here or click to select</p>
        <form id="upload-form" enctype="multipart/form-data" action="/upload" method="post">
            <input type="file" id="file-input" name="file" style="display: none;">
            <input type="submit" value="Upload">
        </form>
    </div>
    <script>
        const zone = document.getElementById('drop-zone');
        const input = document.getElementById('file-input');
        const form = document.getElementById('upload-form');

        zone.addEventListener('dragover', (e) => {
            e.preventDefault();
            zone.classList.add('dragover');
        });
        zone.addEventListener('dragleave', () => zone.classList.remove('dragover'));
        zone.addEventListener('drop', (e) => {
            e.preventDefault();
            zone.classList.remove('dragover');
            if (e.dataTransfer.files.length > 0) {
                input.files = e.dataTransfer.files;
                form.submit();
            }
        });
        zone.addEventListener('click', (e) => {
            if (e.target.type !== 'submit') {
                input.click();
            }
        });
        input.addEventListener('change', () => {
            if (input.files.length > 0) {
                form.submit();
            }
        });
    </script>
</body>
</html>
"#;

/// Page returned after a successful upload
pub fn upload_success(filename: &str, download_url: &str) -> String {
    let name = html_escape(filename);
    let url = html_escape(download_url);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>catbox - Upload Success</title>
</head>
<body>
    <h1>File Uploaded Successfully</h1>
    <p>File: {name}</p>
    <p><a href="{url}">Download {name}</a></p>
    <p><a href="/">Upload another file</a></p>
</body>
</html>
"#
    )
}

/// Escape text for an HTML body or a double-quoted attribute
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
