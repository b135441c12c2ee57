//! HTML body of the welcome message.

/// Content-ID binding the `<img>` tag to the inline attachment.
pub const QR_CONTENT_ID: &str = "qrcode";

/// Render the welcome template with the QR image referenced by `content_id`.
pub fn welcome_html(content_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        .container {{
            max-width: 600px;
            margin: auto;
            padding: 20px;
            font-family: Arial, sans-serif;
            background-color: #ffffff;
        }}
        .header {{
            background: #4F46E5;
            color: white;
            padding: 20px;
            text-align: center;
            border-radius: 10px;
            margin-bottom: 20px;
        }}
        .content {{
            margin: 20px 0;
            line-height: 1.6;
            color: #333333;
        }}
        .qr-section {{
            text-align: center;
            margin: 20px 0;
            padding: 20px;
            background-color: #f8f9fa;
            border-radius: 10px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Welcome! 🚀</h1>
        </div>
        <div class="content">
            <p>Thank you for joining us!</p>
            <div class="qr-section">
                <img src="cid:{content_id}" alt="QR Code" style="width: 200px; height: 200px;"/>
                <p style="color: #666; margin-top: 10px;">Scan to access your dashboard</p>
            </div>
        </div>
    </div>
</body>
</html>
"#
    )
}
